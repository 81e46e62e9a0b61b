use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use recruiter::workflows::application::Language;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_language(raw: &str) -> Result<Language, String> {
    Language::from_code(raw).ok_or_else(|| {
        let supported: Vec<&str> = Language::ordered()
            .into_iter()
            .map(Language::code)
            .collect();
        format!("unsupported language '{raw}' (expected one of: {})", supported.join(", "))
    })
}
