pub struct ProviderInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub env_var: &'static str,
    pub base_url: &'static str,
    /// Only meaningful for analysis providers.
    pub default_model: Option<&'static str>,
}

pub static SOURCE_PROVIDERS: &[ProviderInfo] = &[ProviderInfo {
    id: "nvd",
    name: "NIST National Vulnerability Database",
    env_var: "NVD_API_KEY",
    base_url: super::nvd::NVD_BASE_URL,
    default_model: None,
}];

pub static ANALYSIS_PROVIDERS: &[ProviderInfo] = &[ProviderInfo {
    id: "openai",
    name: "OpenAI",
    env_var: "OPENAI_API_KEY",
    base_url: super::openai::OPENAI_BASE_URL,
    default_model: Some("gpt-4o"),
}];

pub fn get_provider(id: &str) -> Option<&'static ProviderInfo> {
    SOURCE_PROVIDERS
        .iter()
        .chain(ANALYSIS_PROVIDERS.iter())
        .find(|p| p.id == id)
}

pub fn default_model(provider_id: &str) -> &'static str {
    get_provider(provider_id)
        .and_then(|p| p.default_model)
        .unwrap_or("gpt-4o")
}
