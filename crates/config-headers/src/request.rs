//! The view of an outgoing request the injector works against

use rvoip_sip_message::{Header, HeaderName, Method, NameAddr, Request};

use crate::error::InjectResult;

/// Outgoing SIP request that custom headers can be applied to
///
/// Implemented for [`rvoip_sip_message::Request`]; other stacks can implement
/// it over their own request type.
pub trait OutgoingRequest {
    fn method(&self) -> &Method;

    /// Dialog sequence number from the CSeq header
    fn cseq_number(&self) -> Option<u32>;

    fn from_address(&self) -> Option<NameAddr>;

    fn to_address(&self) -> Option<NameAddr>;

    /// First header with this name
    fn header(&self, name: &HeaderName) -> Option<&Header>;

    /// Replaces every value of the header's name with this one
    fn set_header(&mut self, header: Header) -> InjectResult<()>;

    /// Appends a value, keeping existing values of the same name
    fn add_header(&mut self, header: Header) -> InjectResult<()>;

    /// Drops every custom-marked value of `name`, returning how many were removed
    fn remove_custom_headers(&mut self, name: &HeaderName) -> usize;
}

impl OutgoingRequest for Request {
    fn method(&self) -> &Method {
        &self.method
    }

    fn cseq_number(&self) -> Option<u32> {
        self.cseq().map(|c| c.seq)
    }

    fn from_address(&self) -> Option<NameAddr> {
        Request::from_addr(self)
    }

    fn to_address(&self) -> Option<NameAddr> {
        Request::to_addr(self)
    }

    fn header(&self, name: &HeaderName) -> Option<&Header> {
        Request::header(self, name)
    }

    fn set_header(&mut self, header: Header) -> InjectResult<()> {
        Request::set_header(self, header);
        Ok(())
    }

    fn add_header(&mut self, header: Header) -> InjectResult<()> {
        Request::add_header(self, header);
        Ok(())
    }

    fn remove_custom_headers(&mut self, name: &HeaderName) -> usize {
        self.remove_headers_where(|h| h.is_custom() && h.name == *name)
    }
}
