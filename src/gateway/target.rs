//! Downstream URL resolution.

use std::collections::HashMap;

use crate::routing::template::{PathTemplate, TemplateError};

/// Build the downstream URL for a request.
///
/// The service path template is used when set and non-empty, otherwise the
/// gateway path template. Placeholders are filled from the matched path params.
pub fn resolve(
    service_url: &str,
    gateway_template: &str,
    service_template: Option<&str>,
    path_params: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    let template = service_template
        .filter(|t| !t.is_empty())
        .unwrap_or(gateway_template);
    let path = PathTemplate::parse(template)?.render(path_params)?;
    Ok(format!("{}{}", service_url.trim_end_matches('/'), path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_service_path_preferred() {
        let url = resolve(
            "http://microservice:8002",
            "/path_param/{random_int}",
            Some("/v1/path_param/{random_int}"),
            &params(&[("random_int", "1337")]),
        )
        .unwrap();
        assert_eq!(url, "http://microservice:8002/v1/path_param/1337");
    }

    #[test]
    fn test_gateway_path_fallback() {
        let p = params(&[("id", "7")]);
        let expected = "http://svc/items/7";
        assert_eq!(resolve("http://svc/", "/items/{id}", None, &p).unwrap(), expected);
        assert_eq!(resolve("http://svc", "/items/{id}", Some(""), &p).unwrap(), expected);
    }

    #[test]
    fn test_missing_path_param_fails() {
        let err = resolve("http://svc", "/items/{id}", None, &HashMap::new()).unwrap_err();
        assert!(matches!(err, TemplateError::MissingParam { ref name, .. } if name == "id"));
    }
}
