//! Transfer types and data-type negotiation between a drag source and a drop target.
//!
//! A [`Transfer`] is a handler for one family of payloads (plain text, HTML,
//! file lists, ...).  Drag sources and drop targets each declare an ordered
//! list of transfers.  Before any data can move, both sides must agree on a
//! concrete [`TransferData`] type that a source transfer produces and a target
//! transfer accepts: [`determine_data_types`] computes every such candidate.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Type id of [`TextTransfer`].
pub const TEXT_TYPE: i32 = 1;
/// Type id of [`HtmlTransfer`].
pub const HTML_TYPE: i32 = 2;
/// Type id of [`UrlTransfer`].
pub const URL_TYPE: i32 = 3;
/// Type id of [`FileTransfer`].
pub const FILE_TYPE: i32 = 4;

/// A negotiated data-type descriptor.
///
/// Only the integer type tag takes part in comparisons; it is the value the
/// client reports in the `dataType` notify property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferData {
    pub type_id: i32,
}

impl TransferData {
    pub const fn new(type_id: i32) -> Self {
        Self { type_id }
    }

    /// Returns `true` if both descriptors denote the same type.
    pub fn same_type(&self, other: &TransferData) -> bool {
        self.type_id == other.type_id
    }
}

/// A payload produced by a drag source and delivered to a drop target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum TransferPayload {
    Text(String),
    Html(String),
    Url(String),
    Files(Vec<String>),
    Bytes(Vec<u8>),
}

/// A transfer handler declared by a drag source or a drop target.
#[cfg_attr(test, mockall::automock)]
pub trait Transfer: Send + Sync {
    /// Human-readable name used in logs and fixtures.
    fn name(&self) -> String;

    /// Every type this transfer can produce, in preference order.
    fn supported_types(&self) -> Vec<TransferData>;

    /// Returns `true` if this transfer can consume `data_type`.
    fn is_supported_type(&self, data_type: &TransferData) -> bool;

    /// Converts the payload set by the drag source into the value delivered to
    /// the drop target.
    ///
    /// Returns `None` when the payload is of the wrong kind, empty, or the
    /// type is not supported.
    fn convert(&self, payload: &TransferPayload, data_type: &TransferData)
        -> Option<TransferPayload>;
}

// ── Negotiation ───────────────────────────────────────────────────────────────

/// Computes the data types both endpoints understand.
///
/// For every source transfer (in declaration order), for every target
/// transfer (in declaration order), every type the source transfer produces
/// that the target transfer accepts is appended.  Duplicates are kept; an
/// empty result means no drop is possible.
pub fn determine_data_types<S, T>(
    source_transfers: &[S],
    target_transfers: &[T],
) -> Vec<TransferData>
where
    S: AsRef<dyn Transfer>,
    T: AsRef<dyn Transfer>,
{
    let mut supported = Vec::new();
    for source_transfer in source_transfers {
        let data_types = source_transfer.as_ref().supported_types();
        for target_transfer in target_transfers {
            let target_transfer = target_transfer.as_ref();
            supported.extend(
                data_types
                    .iter()
                    .filter(|data_type| target_transfer.is_supported_type(data_type))
                    .copied(),
            );
        }
    }
    trace!(count = supported.len(), "negotiated data types");
    supported
}

/// Returns `candidate` if it has the same type as an entry of `valid_types`.
///
/// `None` candidates and empty `valid_types` always yield `None`.
pub fn check_data_type(
    candidate: Option<TransferData>,
    valid_types: &[TransferData],
) -> Option<TransferData> {
    let candidate = candidate?;
    valid_types
        .iter()
        .any(|valid| candidate.same_type(valid))
        .then_some(candidate)
}

/// Returns the first transfer in `transfers` that accepts `data_type`.
pub fn find_transfer_by_type<'a, T>(
    transfers: &'a [T],
    data_type: &TransferData,
) -> Option<&'a dyn Transfer>
where
    T: AsRef<dyn Transfer>,
{
    transfers
        .iter()
        .map(AsRef::as_ref)
        .find(|transfer| transfer.is_supported_type(data_type))
}

// ── Built-in transfers ────────────────────────────────────────────────────────

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

/// Plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTransfer;

impl Transfer for TextTransfer {
    fn name(&self) -> String {
        "text".to_string()
    }

    fn supported_types(&self) -> Vec<TransferData> {
        vec![TransferData::new(TEXT_TYPE)]
    }

    fn is_supported_type(&self, data_type: &TransferData) -> bool {
        data_type.type_id == TEXT_TYPE
    }

    fn convert(
        &self,
        payload: &TransferPayload,
        data_type: &TransferData,
    ) -> Option<TransferPayload> {
        match payload {
            TransferPayload::Text(text) if self.is_supported_type(data_type) => {
                non_empty(text).map(TransferPayload::Text)
            }
            _ => None,
        }
    }
}

/// HTML fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTransfer;

impl Transfer for HtmlTransfer {
    fn name(&self) -> String {
        "html".to_string()
    }

    fn supported_types(&self) -> Vec<TransferData> {
        vec![TransferData::new(HTML_TYPE)]
    }

    fn is_supported_type(&self, data_type: &TransferData) -> bool {
        data_type.type_id == HTML_TYPE
    }

    fn convert(
        &self,
        payload: &TransferPayload,
        data_type: &TransferData,
    ) -> Option<TransferPayload> {
        match payload {
            TransferPayload::Html(html) if self.is_supported_type(data_type) => {
                non_empty(html).map(TransferPayload::Html)
            }
            _ => None,
        }
    }
}

/// A single URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlTransfer;

impl Transfer for UrlTransfer {
    fn name(&self) -> String {
        "url".to_string()
    }

    fn supported_types(&self) -> Vec<TransferData> {
        vec![TransferData::new(URL_TYPE)]
    }

    fn is_supported_type(&self, data_type: &TransferData) -> bool {
        data_type.type_id == URL_TYPE
    }

    fn convert(
        &self,
        payload: &TransferPayload,
        data_type: &TransferData,
    ) -> Option<TransferPayload> {
        match payload {
            TransferPayload::Url(url) if self.is_supported_type(data_type) => {
                non_empty(url.trim()).map(TransferPayload::Url)
            }
            _ => None,
        }
    }
}

/// A list of file names.  Empty lists and empty names are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTransfer;

impl Transfer for FileTransfer {
    fn name(&self) -> String {
        "file".to_string()
    }

    fn supported_types(&self) -> Vec<TransferData> {
        vec![TransferData::new(FILE_TYPE)]
    }

    fn is_supported_type(&self, data_type: &TransferData) -> bool {
        data_type.type_id == FILE_TYPE
    }

    fn convert(
        &self,
        payload: &TransferPayload,
        data_type: &TransferData,
    ) -> Option<TransferPayload> {
        match payload {
            TransferPayload::Files(files)
                if self.is_supported_type(data_type)
                    && !files.is_empty()
                    && files.iter().all(|f| !f.is_empty()) =>
            {
                Some(TransferPayload::Files(files.clone()))
            }
            _ => None,
        }
    }
}

/// An application-defined binary format identified by its own type id.
#[derive(Debug, Clone)]
pub struct ByteArrayTransfer {
    name: String,
    type_id: i32,
}

impl ByteArrayTransfer {
    /// Registers a custom format.  Ids of the built-in transfers are reserved.
    pub fn new(name: impl Into<String>, type_id: i32) -> Option<Self> {
        if (TEXT_TYPE..=FILE_TYPE).contains(&type_id) {
            return None;
        }
        Some(Self {
            name: name.into(),
            type_id,
        })
    }
}

impl Transfer for ByteArrayTransfer {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn supported_types(&self) -> Vec<TransferData> {
        vec![TransferData::new(self.type_id)]
    }

    fn is_supported_type(&self, data_type: &TransferData) -> bool {
        data_type.type_id == self.type_id
    }

    fn convert(
        &self,
        payload: &TransferPayload,
        data_type: &TransferData,
    ) -> Option<TransferPayload> {
        match payload {
            TransferPayload::Bytes(bytes) if self.is_supported_type(data_type) => {
                Some(TransferPayload::Bytes(bytes.clone()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn text() -> TransferData {
        TransferData::new(TEXT_TYPE)
    }

    fn file() -> TransferData {
        TransferData::new(FILE_TYPE)
    }

    fn boxed(transfer: impl Transfer + 'static) -> Arc<dyn Transfer> {
        Arc::new(transfer)
    }

    /// A mock transfer that produces `produces` and accepts `accepts`.
    fn mock_transfer(produces: Vec<TransferData>, accepts: Vec<i32>) -> Arc<dyn Transfer> {
        let mut mock = MockTransfer::new();
        mock.expect_supported_types().return_const(produces);
        mock.expect_is_supported_type()
            .returning(move |t| accepts.contains(&t.type_id));
        Arc::new(mock)
    }

    // ── determine_data_types ──────────────────────────────────────────────────

    #[test]
    fn test_determine_data_types_intersects_source_and_target() {
        // Arrange
        let source = vec![boxed(TextTransfer), boxed(FileTransfer)];
        let target = vec![boxed(FileTransfer)];

        // Act
        let types = determine_data_types(&source, &target);

        // Assert
        assert_eq!(types, vec![file()]);
    }

    #[test]
    fn test_determine_data_types_is_source_major_then_target_then_type() {
        // Arrange – source transfer produces [7, 8]; two target transfers accept
        // 8 and {7, 8} respectively.
        let t7 = TransferData::new(7);
        let t8 = TransferData::new(8);
        let source = vec![mock_transfer(vec![t7, t8], vec![])];
        let target = vec![mock_transfer(vec![], vec![8]), mock_transfer(vec![], vec![7, 8])];

        // Act
        let types = determine_data_types(&source, &target);

        // Assert – duplicates across target transfers are kept
        assert_eq!(types, vec![t8, t7, t8]);
    }

    #[test]
    fn test_determine_data_types_empty_when_nothing_matches() {
        let source = vec![boxed(TextTransfer)];
        let target = vec![boxed(HtmlTransfer), boxed(UrlTransfer)];

        assert!(determine_data_types(&source, &target).is_empty());
    }

    #[test]
    fn test_determine_data_types_is_idempotent() {
        let source = vec![boxed(TextTransfer), boxed(HtmlTransfer), boxed(FileTransfer)];
        let target = vec![boxed(FileTransfer), boxed(TextTransfer)];

        let first = determine_data_types(&source, &target);
        let second = determine_data_types(&source, &target);

        assert_eq!(first, second);
        assert_eq!(first, vec![text(), file()]);
    }

    // ── check_data_type ───────────────────────────────────────────────────────

    #[test]
    fn test_check_data_type_returns_matching_candidate() {
        assert_eq!(check_data_type(Some(file()), &[text(), file()]), Some(file()));
    }

    #[test]
    fn test_check_data_type_rejects_unknown_candidate() {
        assert_eq!(check_data_type(Some(TransferData::new(99)), &[text(), file()]), None);
    }

    #[test]
    fn test_check_data_type_empty_set_is_always_none() {
        for id in [TEXT_TYPE, HTML_TYPE, URL_TYPE, FILE_TYPE, 0, -1] {
            assert_eq!(check_data_type(Some(TransferData::new(id)), &[]), None);
        }
        assert_eq!(check_data_type(None, &[]), None);
    }

    #[test]
    fn test_check_data_type_none_candidate_is_none() {
        assert_eq!(check_data_type(None, &[text()]), None);
    }

    // ── find_transfer_by_type ─────────────────────────────────────────────────

    #[test]
    fn test_find_transfer_by_type_returns_first_accepting_transfer() {
        let transfers = vec![boxed(TextTransfer), boxed(FileTransfer)];

        let found = find_transfer_by_type(&transfers, &file()).expect("file transfer");

        assert_eq!(found.name(), "file");
        assert!(find_transfer_by_type(&transfers, &TransferData::new(HTML_TYPE)).is_none());
    }

    // ── Built-in conversions ──────────────────────────────────────────────────

    #[test]
    fn test_text_transfer_rejects_empty_text_and_wrong_kind() {
        let transfer = TextTransfer;

        assert_eq!(
            transfer.convert(&TransferPayload::Text("abc".into()), &text()),
            Some(TransferPayload::Text("abc".into()))
        );
        assert_eq!(transfer.convert(&TransferPayload::Text(String::new()), &text()), None);
        assert_eq!(transfer.convert(&TransferPayload::Html("<b/>".into()), &text()), None);
    }

    #[test]
    fn test_file_transfer_rejects_empty_lists_and_names() {
        let transfer = FileTransfer;

        assert!(transfer
            .convert(&TransferPayload::Files(vec!["a.txt".into()]), &file())
            .is_some());
        assert!(transfer.convert(&TransferPayload::Files(vec![]), &file()).is_none());
        assert!(transfer
            .convert(&TransferPayload::Files(vec![String::new()]), &file())
            .is_none());
    }

    #[test]
    fn test_byte_array_transfer_reserves_builtin_ids() {
        assert!(ByteArrayTransfer::new("custom", TEXT_TYPE).is_none());

        let custom = ByteArrayTransfer::new("custom", 100).expect("free id");
        assert_eq!(custom.supported_types(), vec![TransferData::new(100)]);
        assert_eq!(
            custom.convert(&TransferPayload::Bytes(vec![1, 2]), &TransferData::new(100)),
            Some(TransferPayload::Bytes(vec![1, 2]))
        );
    }
}
