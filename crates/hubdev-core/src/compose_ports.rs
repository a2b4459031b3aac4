//! Port mapping upsert for the generated docker-compose.yml

use crate::{CoreError, Result};
use serde_yaml::Value;
use std::path::Path;

/// Ensure `services.<service>.ports` contains `mapping`, rewriting the file
/// only when the mapping was missing. Returns whether the file changed.
pub async fn ensure_port_mapping(path: &Path, service: &str, mapping: &str) -> Result<bool> {
    let content = tokio::fs::read_to_string(path).await?;

    let updated = upsert_port_mapping(&content, service, mapping).map_err(|message| {
        CoreError::ConfigParse {
            path: path.to_path_buf(),
            message,
        }
    })?;

    match updated {
        Some(serialized) => {
            tokio::fs::write(path, serialized).await?;
            tracing::debug!("Added port {} to {} in {}", mapping, service, path.display());
            Ok(true)
        }
        None => {
            tracing::debug!("Port {} already mapped for {}", mapping, service);
            Ok(false)
        }
    }
}

/// Pure form of [`ensure_port_mapping`]: `Ok(None)` when the mapping is
/// already present, otherwise the re-serialized document.
pub fn upsert_port_mapping(
    content: &str,
    service: &str,
    mapping: &str,
) -> std::result::Result<Option<String>, String> {
    let mut doc: Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;

    let service_config = doc
        .get_mut("services")
        .and_then(|services| services.get_mut(service))
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| format!("no services.{} mapping", service))?;

    if !service_config.contains_key("ports") {
        service_config.insert(Value::from("ports"), Value::Sequence(Vec::new()));
    }
    let ports = service_config
        .get_mut("ports")
        .ok_or_else(|| format!("no services.{}.ports", service))?;
    if ports.is_null() {
        *ports = Value::Sequence(Vec::new());
    }
    let ports = ports
        .as_sequence_mut()
        .ok_or_else(|| format!("services.{}.ports is not a list", service))?;

    if ports.iter().any(|port| port.as_str() == Some(mapping)) {
        return Ok(None);
    }
    ports.push(Value::from(mapping));

    serde_yaml::to_string(&doc)
        .map(Some)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPOSE: &str = r#"version: '2.1'
services:
  postgres:
    image: blackducksoftware/hub-postgres:4.2.0
  webapp:
    image: blackducksoftware/hub-webapp:4.2.0
    ports:
      - "443:8443"
    environment:
      HUB_WEBSERVER_HOST: localhost
"#;

    fn ports_of(yaml: &str, service: &str) -> Vec<String> {
        let doc: Value = serde_yaml::from_str(yaml).unwrap();
        doc["services"][service]["ports"]
            .as_sequence()
            .unwrap()
            .iter()
            .map(|p| p.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_upsert_appends_missing_mapping() {
        let updated = upsert_port_mapping(COMPOSE, "webapp", "8080:8080")
            .unwrap()
            .unwrap();
        assert_eq!(ports_of(&updated, "webapp"), vec!["443:8443", "8080:8080"]);

        // The rest of the document survives
        let doc: Value = serde_yaml::from_str(&updated).unwrap();
        assert_eq!(
            doc["services"]["webapp"]["environment"]["HUB_WEBSERVER_HOST"].as_str(),
            Some("localhost")
        );
        assert!(doc["services"]["postgres"].is_mapping());
    }

    #[test]
    fn test_upsert_existing_mapping_is_noop() {
        let updated = upsert_port_mapping(COMPOSE, "webapp", "443:8443").unwrap();
        assert!(updated.is_none());
    }

    #[test]
    fn test_upsert_output_is_block_style() {
        let updated = upsert_port_mapping(COMPOSE, "webapp", "8080:8080")
            .unwrap()
            .unwrap();
        assert!(!updated.contains('['));
        assert!(!updated.contains('{'));
        assert!(updated.contains("- "));
    }

    #[test]
    fn test_upsert_creates_ports_list() {
        let updated = upsert_port_mapping(COMPOSE, "postgres", "5432:5432")
            .unwrap()
            .unwrap();
        assert_eq!(ports_of(&updated, "postgres"), vec!["5432:5432"]);

        let empty_ports = "services:\n  webapp:\n    ports:\n";
        let updated = upsert_port_mapping(empty_ports, "webapp", "8080:8080")
            .unwrap()
            .unwrap();
        assert_eq!(ports_of(&updated, "webapp"), vec!["8080:8080"]);
    }

    #[test]
    fn test_upsert_missing_service_errors() {
        let err = upsert_port_mapping(COMPOSE, "proxy", "8080:8080").unwrap_err();
        assert!(err.contains("services.proxy"));

        let err = upsert_port_mapping("version: '2'\n", "webapp", "8080:8080").unwrap_err();
        assert!(err.contains("services.webapp"));
    }

    #[test]
    fn test_upsert_invalid_yaml_errors() {
        assert!(upsert_port_mapping("services: [unclosed", "webapp", "8080:8080").is_err());
    }

    #[tokio::test]
    async fn test_ensure_port_mapping_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("docker-compose.yml");
        std::fs::write(&path, COMPOSE).unwrap();

        assert!(ensure_port_mapping(&path, "webapp", "8080:8080").await.unwrap());
        let once = std::fs::read_to_string(&path).unwrap();

        assert!(!ensure_port_mapping(&path, "webapp", "8080:8080").await.unwrap());
        let twice = std::fs::read_to_string(&path).unwrap();

        assert_eq!(once, twice);
        assert_eq!(ports_of(&twice, "webapp"), vec!["443:8443", "8080:8080"]);
    }

    #[tokio::test]
    async fn test_ensure_port_mapping_leaves_file_untouched_when_present() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("docker-compose.yml");
        std::fs::write(&path, COMPOSE).unwrap();

        assert!(!ensure_port_mapping(&path, "webapp", "443:8443").await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), COMPOSE);
    }

    #[tokio::test]
    async fn test_ensure_port_mapping_parse_error_names_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("docker-compose.yml");
        std::fs::write(&path, "services:\n  db: {}\n").unwrap();

        let err = ensure_port_mapping(&path, "webapp", "8080:8080")
            .await
            .unwrap_err();
        match err {
            CoreError::ConfigParse { path: p, message } => {
                assert_eq!(p, path);
                assert!(message.contains("services.webapp"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
