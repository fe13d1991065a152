use crate::core::normalize::normalize_fields;
use crate::domain::model::{DocumentValue, ExportTable, Fields, ParticipantDocument, ResponseRow};

/// 將每位參與者的 `responses` 展開成一列一回應
pub fn flatten_participant(participant: &Fields) -> Vec<ResponseRow> {
    let responses = match participant.get("responses") {
        None => return Vec::new(),
        Some(DocumentValue::Array(items)) => items,
        Some(other) => {
            tracing::warn!(
                "⚠️ Participant {:?} has non-array responses, skipping: {}",
                participant.get("prolificId").map(DocumentValue::to_cell),
                other.to_cell()
            );
            return Vec::new();
        }
    };

    let empty = Fields::new();
    responses
        .iter()
        .map(|response| {
            // 非 map 的回應仍輸出一列 (全為空值)
            let response = response.as_map().unwrap_or(&empty);
            ResponseRow {
                prolific_id: participant.get("prolificId").cloned(),
                start_time: participant.get("startTime").cloned(),
                original_statement: response.get("original_statement").cloned(),
                original_label: response.get("original_label").cloned(),
                pass_verification: response.get("pass_verification").cloned(),
                label_alignment: response.get("labelAlignment").cloned(),
                redundant_content: response.get("redundantContent").cloned(),
                natural_flow: response.get("naturalFlow").cloned(),
                response_timestamp: response.get("timestamp").cloned(),
            }
        })
        .collect()
}

/// 正規化並展開所有文件，保持文件與回應的原始順序
pub fn flatten_documents(documents: Vec<ParticipantDocument>) -> ExportTable {
    let mut rows = Vec::new();

    for document in documents {
        let fields = normalize_fields(document.fields);
        let participant_rows = flatten_participant(&fields);
        tracing::debug!(
            "Document {} contributed {} rows",
            document.id,
            participant_rows.len()
        );
        rows.extend(participant_rows);
    }

    ExportTable { rows }
}
