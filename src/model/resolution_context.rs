use serde::{Deserialize, Serialize};

use crate::model::{Operation, WriteSet};

/// Input of one resolution engine call
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    /// Path being resolved
    pub uri: &'a str,
    /// Top-level request path the resolution is part of
    pub request_uri: &'a str,
    pub oper: Operation,
    /// Store data already read for this request (GET only)
    pub db_data: Option<&'a WriteSet>,
}

impl<'a> ResolveRequest<'a> {
    pub fn new(uri: &'a str, oper: Operation) -> Self {
        Self {
            uri,
            request_uri: uri,
            oper,
            db_data: None,
        }
    }

    pub fn within(mut self, request_uri: &'a str) -> Self {
        self.request_uri = request_uri;
        self
    }

    pub fn with_db_data(mut self, db_data: &'a WriteSet) -> Self {
        self.db_data = Some(db_data);
        self
    }
}

/// Result of one resolution engine call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    /// Schema path of the resolved node
    pub xpath: String,
    /// Owning table; empty when unresolved
    pub table_name: String,
    /// Concrete store key
    pub db_key: String,
    /// Table has no physical presence; data is produced by callbacks
    pub is_virtual_tbl: bool,
}

impl ResolvedTarget {
    pub fn unresolved(xpath: impl Into<String>) -> Self {
        Self {
            xpath: xpath.into(),
            ..Default::default()
        }
    }

    pub fn has_table(&self) -> bool {
        !self.table_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_defaults_request_uri() {
        let req = ResolveRequest::new("/a/b[k=1]", Operation::Get);
        assert_eq!(req.request_uri, "/a/b[k=1]");
        let req = req.within("/a");
        assert_eq!(req.request_uri, "/a");
        assert!(req.db_data.is_none());
    }

    #[test]
    fn test_unresolved_target() {
        let target = ResolvedTarget::unresolved("/a/b");
        assert_eq!(target.xpath, "/a/b");
        assert!(!target.has_table());
        assert!(target.db_key.is_empty());
        assert!(!target.is_virtual_tbl);
    }
}
