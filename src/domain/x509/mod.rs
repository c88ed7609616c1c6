//! X.509 certificate model built on the positional DER reader.

mod certificate;
mod subject;
mod time;

pub use certificate::{Certificate, ParentRef};
pub use subject::{decode_subject, oid_name, Subject};
pub use time::{parse_record_time, parse_time_node, truncate_to_seconds};
