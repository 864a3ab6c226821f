//! Shared header accessors for requests and responses

use super::typed_header::{CSeq, CallId, TypedHeader};
use crate::types::address::Address;

/// Read and edit typed headers on a SIP message
pub trait HeaderAccess {
    fn headers(&self) -> &[TypedHeader];

    fn headers_mut(&mut self) -> &mut Vec<TypedHeader>;

    /// Append a header, keeping any existing headers of the same kind
    fn push_header(&mut self, header: TypedHeader) {
        self.headers_mut().push(header);
    }

    /// Replace every header of the same kind with `header`
    fn set_header(&mut self, header: TypedHeader) {
        let headers = self.headers_mut();
        match headers.iter().position(|h| h.same_kind(&header)) {
            Some(pos) => {
                headers[pos] = header.clone();
                let mut idx = 0;
                headers.retain(|h| {
                    let keep = idx <= pos || !h.same_kind(&header);
                    idx += 1;
                    keep
                });
            }
            None => headers.push(header),
        }
    }

    /// Remove all headers with the given name
    fn remove_headers(&mut self, name: &str) {
        self.headers_mut()
            .retain(|h| !h.name().eq_ignore_ascii_case(name));
    }

    fn from(&self) -> Option<&Address> {
        self.headers().iter().find_map(|h| match h {
            TypedHeader::From(a) => Some(a),
            _ => None,
        })
    }

    fn to(&self) -> Option<&Address> {
        self.headers().iter().find_map(|h| match h {
            TypedHeader::To(a) => Some(a),
            _ => None,
        })
    }

    fn to_mut(&mut self) -> Option<&mut Address> {
        self.headers_mut().iter_mut().find_map(|h| match h {
            TypedHeader::To(a) => Some(a),
            _ => None,
        })
    }

    fn call_id(&self) -> Option<&CallId> {
        self.headers().iter().find_map(|h| match h {
            TypedHeader::CallId(c) => Some(c),
            _ => None,
        })
    }

    fn cseq(&self) -> Option<&CSeq> {
        self.headers().iter().find_map(|h| match h {
            TypedHeader::CSeq(c) => Some(c),
            _ => None,
        })
    }

    /// Contact headers in message order
    fn contacts(&self) -> Vec<&Address> {
        self.headers()
            .iter()
            .filter_map(|h| match h {
                TypedHeader::Contact(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    /// Record-Route headers in message order
    fn record_routes(&self) -> Vec<&Address> {
        self.headers()
            .iter()
            .filter_map(|h| match h {
                TypedHeader::RecordRoute(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    /// Route headers in message order
    fn routes(&self) -> Vec<&Address> {
        self.headers()
            .iter()
            .filter_map(|h| match h {
                TypedHeader::Route(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    fn content_type(&self) -> Option<&str> {
        self.headers().iter().find_map(|h| match h {
            TypedHeader::ContentType(ct) => Some(ct.as_str()),
            _ => None,
        })
    }
}
