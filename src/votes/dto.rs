use serde::Deserialize;
use uuid::Uuid;

/// Request body for casting a vote. The voter comes from the session.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub dilemma_id: Uuid,
    pub option: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_body() {
        let body = r#"{"dilemmaId":"4b4b4b4b-1111-2222-3333-444444444444","option":1}"#;
        let req: VoteRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.option, 1);
    }
}
