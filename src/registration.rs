//! Registration artifact parsing.
//!
//! A module's artifact file is a YAML stream carrying its registration
//! documents: normally the registration plus its deployment, written as two
//! documents. Legacy artifacts carry a single document; that is accepted as a
//! compatibility mode. The documents stay untyped — exm records and ships
//! them, it does not interpret them.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::ExmError;

/// One registration document, kept as untyped YAML.
pub type Registration = serde_yaml::Value;

/// Parse an artifact's bytes into its registration documents.
///
/// # Errors
///
/// Malformed YAML is an error, as is a stream with zero documents or more
/// than two.
pub fn parse(data: &[u8]) -> Result<Vec<Registration>> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(ExmError::InvalidRegistration {
            reason: "no documents found".to_string(),
        }
        .into());
    }

    let mut documents = Vec::new();
    for deserializer in serde_yaml::Deserializer::from_slice(data) {
        let document = Registration::deserialize(deserializer)
            .context("could not decode registration document")?;
        documents.push(document);
    }

    match documents.len() {
        // Compatibility mode: only one document is present in the artifact.
        1 | 2 => Ok(documents),
        0 => Err(ExmError::InvalidRegistration {
            reason: "no documents found".to_string(),
        }
        .into()),
        count => Err(ExmError::InvalidRegistration {
            reason: format!("expected at most two documents, found {count}"),
        }
        .into()),
    }
}

/// Serialize registration documents back into a `---`-separated YAML stream.
pub fn to_yaml_stream(registrations: &[Registration]) -> Result<String> {
    let mut out = String::new();
    for (i, registration) in registrations.iter().enumerate() {
        if i != 0 {
            out.push_str("---\n");
        }
        out.push_str(
            &serde_yaml::to_string(registration)
                .context("could not encode registration document")?,
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = "kind: ExtensionRegistration\nname: dns\n";
    const DOUBLE: &str =
        "kind: ExtensionRegistration\nname: dns\n---\nkind: ExtensionDeployment\nname: dns\n";

    #[test]
    fn accepts_a_single_legacy_document() {
        let documents = parse(SINGLE.as_bytes()).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["name"], "dns");
    }

    #[test]
    fn accepts_two_documents_in_source_order() {
        let documents = parse(DOUBLE.as_bytes()).unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0]["kind"], "ExtensionRegistration");
        assert_eq!(documents[1]["kind"], "ExtensionDeployment");
    }

    #[test]
    fn rejects_empty_streams() {
        let err = parse(b"").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExmError>(),
            Some(ExmError::InvalidRegistration { .. })
        ));
    }

    #[test]
    fn rejects_more_than_two_documents() {
        let stream = format!("{DOUBLE}---\nkind: Extra\n");
        let err = parse(stream.as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExmError>(),
            Some(ExmError::InvalidRegistration { .. })
        ));
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(parse(b"kind: [unclosed").is_err());
    }

    #[test]
    fn yaml_stream_round_trips() {
        let documents = parse(DOUBLE.as_bytes()).unwrap();
        let stream = to_yaml_stream(&documents).unwrap();
        let reparsed = parse(stream.as_bytes()).unwrap();
        assert_eq!(documents, reparsed);
    }
}
