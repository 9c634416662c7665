//! Fingerprint-artifact detection and removal
//!
//! Automation-aware control stacks leave `<token>_<token>_(Array|Promise|
//! Symbol)` properties on the page's global object; detection scripts on
//! visited sites enumerate `window` looking for exactly that shape. Before
//! each navigation we enumerate the same way and, when anything matches,
//! schedule a delete script through the new-document injection channel so
//! it runs before any page script can observe the artifacts.
//!
//! Script failures are never fatal: detection failure counts as "no
//! artifacts", removal failure is logged and navigation proceeds.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::webdriver::RemoteSession;

/// Enumerates `window` and its prototype chain, returning every own
/// property name that matches the artifact pattern.
pub const DETECT_SCRIPT: &str = r#"
let objectToInspect = window;
let result = [];
while (objectToInspect !== null) {
    result = result.concat(Object.getOwnPropertyNames(objectToInspect));
    objectToInspect = Object.getPrototypeOf(objectToInspect);
}
return result.filter(i => i.match(/.+_.+_(Array|Promise|Symbol)/ig));
"#;

/// Companion script: same walk, deletes every matching property.
pub const REMOVE_SCRIPT: &str = r#"
let objectToInspect = window;
let result = [];
while (objectToInspect !== null) {
    result = result.concat(Object.getOwnPropertyNames(objectToInspect));
    objectToInspect = Object.getPrototypeOf(objectToInspect);
}
result.forEach(p => p.match(/.+_.+_(Array|Promise|Symbol)/ig) && delete window[p]);
"#;

/// Rust-side mirror of the script's filter.
pub fn is_fingerprint_artifact(name: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"(?i).+_.+_(Array|Promise|Symbol)").expect("artifact pattern is valid")
    });
    re.is_match(name)
}

/// Run the detection script in the current page. Script failures are
/// logged and reported as "no artifacts found".
pub async fn has_fingerprint_artifacts(session: &dyn RemoteSession) -> bool {
    match session.run_script(DETECT_SCRIPT, Vec::new()).await {
        Ok(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .any(is_fingerprint_artifact),
        Ok(other) => {
            tracing::warn!(?other, "unexpected detection script result");
            false
        }
        Err(err) => {
            tracing::warn!(%err, "fingerprint detection script failed");
            false
        }
    }
}

/// Schedule the delete script on the privileged new-document channel so it
/// executes before page scripts. Best-effort.
pub async fn remove_fingerprint_artifacts(session: &dyn RemoteSession) {
    if let Err(err) = inject_on_new_document(session, REMOVE_SCRIPT).await {
        tracing::warn!(%err, "fingerprint removal script failed");
    }
}

/// Register `script` to run on every new document the browser loads.
pub async fn inject_on_new_document(
    session: &dyn RemoteSession,
    script: &str,
) -> crate::error::Result<Value> {
    session
        .run_protocol_command(
            "Page.addScriptToEvaluateOnNewDocument",
            json!({ "source": script }),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DriverError, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedSession {
        script_result: Mutex<Option<Result<Value>>>,
    }

    impl ScriptedSession {
        fn returning(result: Result<Value>) -> Self {
            Self {
                script_result: Mutex::new(Some(result)),
            }
        }
    }

    #[async_trait]
    impl RemoteSession for ScriptedSession {
        async fn navigate(&self, _url: &str) -> Result<()> {
            Ok(())
        }

        async fn run_script(&self, _src: &str, _args: Vec<Value>) -> Result<Value> {
            self.script_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Ok(Value::Null))
        }

        async fn run_protocol_command(&self, _name: &str, _params: Value) -> Result<Value> {
            Ok(Value::Null)
        }

        async fn stop(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn matcher_accepts_known_artifact_shapes() {
        assert!(is_fingerprint_artifact("cdc_adoQpoasnfa76pfcZLmcfl_Array"));
        assert!(is_fingerprint_artifact("foo_bar_Promise"));
        assert!(is_fingerprint_artifact("FOO_BAR_symbol"));
    }

    #[test]
    fn matcher_rejects_ordinary_names() {
        assert!(!is_fingerprint_artifact("webdriver"));
        assert!(!is_fingerprint_artifact("foo_bar_Object"));
        assert!(!is_fingerprint_artifact("_bar_Promise"));
        assert!(!is_fingerprint_artifact("Array"));
    }

    #[tokio::test]
    async fn detection_true_on_matching_name() {
        let session = ScriptedSession::returning(Ok(json!(["foo_bar_Promise"])));
        assert!(has_fingerprint_artifacts(&session).await);
    }

    #[tokio::test]
    async fn detection_false_on_no_matches() {
        let session = ScriptedSession::returning(Ok(json!(["alert", "document"])));
        assert!(!has_fingerprint_artifacts(&session).await);
    }

    #[tokio::test]
    async fn detection_false_on_empty_result() {
        let session = ScriptedSession::returning(Ok(json!([])));
        assert!(!has_fingerprint_artifacts(&session).await);
    }

    #[tokio::test]
    async fn detection_failure_is_not_fatal() {
        let session =
            ScriptedSession::returning(Err(DriverError::Script("boom".into())));
        assert!(!has_fingerprint_artifacts(&session).await);
    }
}
