//! Submits approve and reject decisions on vacation requests.

use crate::api::DataLoader;
use crate::error::LoadError;
use crate::model::{Action, Decision, DecisionOutcome};
use serde_json::{json, Map, Value};
use tracing::info;

const BATCH_PATH: &str = "/api/vacation/approvals/batch";

fn single_path(id: u64, action: Action) -> String {
    format!("/api/vacation/request/{id}/{action}")
}

/// Posts `decision`. A single request goes to its own endpoint; several go through the batch
/// endpoint in one call. Nothing is retried.
pub async fn submit(loader: &DataLoader, decision: &Decision) -> Result<DecisionOutcome, LoadError> {
    let action = decision.action();
    let ids = decision.request_ids().to_vec();
    let processed = if decision.is_batch() {
        let body = json!({
            "request_ids": ids,
            "action": action,
            "comment": decision.comment(),
        });
        let envelope = loader.post(BATCH_PATH, &body).await?;
        batch_count(&envelope, action).unwrap_or(ids.len() as u64)
    } else {
        let body = json!({ "comment": decision.comment() });
        loader.post(&single_path(ids[0], action), &body).await?;
        1
    };
    let outcome = DecisionOutcome {
        action,
        request_ids: ids,
        processed,
    };
    info!("{}", outcome.message());
    Ok(outcome)
}

/// The batch endpoint reports `data.approved` or `data.rejected`.
fn batch_count(envelope: &Map<String, Value>, action: Action) -> Option<u64> {
    let key = match action {
        Action::Approve => "approved",
        Action::Reject => "rejected",
    };
    envelope.get("data")?.get(key)?.as_u64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestBackend;

    #[test]
    fn test_single_path() {
        assert_eq!(
            single_path(42, Action::Reject),
            "/api/vacation/request/42/reject"
        );
    }

    #[tokio::test]
    async fn test_submit_single_approval() {
        let backend = TestBackend::default();
        let loader = DataLoader::new(Box::new(backend.clone()));
        let decision = Decision::new(Action::Approve, vec![101], None).unwrap();
        let outcome = submit(&loader, &decision).await.unwrap();
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.message(), "1 Antrag genehmigt");
        let posts = backend.posts();
        assert_eq!(posts[0].0, "/api/vacation/request/101/approve");
        assert_eq!(posts[0].1, json!({ "comment": null }));
        assert!(!backend.pending_ids().contains(&101));
    }

    #[tokio::test]
    async fn test_submit_batch_rejection() {
        let backend = TestBackend::default();
        let loader = DataLoader::new(Box::new(backend.clone()));
        let decision =
            Decision::new(Action::Reject, vec![102, 103], Some(" Urlaubssperre ".into())).unwrap();
        let outcome = submit(&loader, &decision).await.unwrap();
        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.message(), "2 Anträge abgelehnt");
        let posts = backend.posts();
        assert_eq!(posts[0].0, BATCH_PATH);
        assert_eq!(
            posts[0].1,
            json!({ "request_ids": [102, 103], "action": "reject", "comment": "Urlaubssperre" })
        );
    }

    #[tokio::test]
    async fn test_unknown_request_is_404() {
        let loader = DataLoader::new(Box::new(TestBackend::default()));
        let decision = Decision::new(Action::Approve, vec![999], None).unwrap();
        let err = submit(&loader, &decision).await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::Network {
                status: Some(404),
                ..
            }
        ));
    }
}
