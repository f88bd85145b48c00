/// Purely advisory identification of the front-end/back-end stack, derived
/// from one benign GET. Detectors never gate behavior on this.
#[derive(Debug, Clone, Default)]
pub struct ServerFingerprint {
    pub server: String,
    pub x_powered_by: String,
    pub via: String,
    pub is_nginx: bool,
    pub is_apache: bool,
    pub is_gunicorn: bool,
}

impl ServerFingerprint {
    pub fn from_headers(headers: &[(String, String)]) -> Self {
        let get = |name: &str| -> String {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.clone())
                .unwrap_or_default()
        };

        let server = get("server");
        let x_powered_by = get("x-powered-by");
        let via = get("via");
        let haystack = format!("{server} {x_powered_by} {via}").to_ascii_lowercase();

        Self {
            is_nginx: haystack.contains("nginx"),
            is_apache: haystack.contains("apache"),
            is_gunicorn: haystack.contains("gunicorn"),
            server,
            x_powered_by,
            via,
        }
    }
}
