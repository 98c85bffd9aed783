//! Settings for the hosted row store (Supabase / PostgREST).

#[derive(Debug, Clone)]
pub struct SupabaseSettings {
    pub url: String,
    pub service_key: String,
    pub table: String,
}

impl SupabaseSettings {
    pub const DEFAULT_TABLE: &'static str = "vagas";

    /// Rows per request; PostgREST caps responses at its `max-rows` anyway.
    pub const PAGE_SIZE: usize = 1_000;

    /// `https://<project>.supabase.co/rest/v1/<table>`
    pub fn table_endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.url.trim_end_matches('/'), self.table)
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.service_key)
    }

    /// Query for one page of rows. `order` must be total or pages can
    /// skip or repeat rows.
    pub fn page_query(order: &str, offset: usize) -> [(&'static str, String); 4] {
        [
            ("select", "*".to_string()),
            ("order", order.to_string()),
            ("limit", Self::PAGE_SIZE.to_string()),
            ("offset", offset.to_string()),
        ]
    }
}
