//! Participants of a single I/O round

use std::fmt;
use std::hash::{Hash, Hasher};

use super::instance::{EndPoint, InstanceId};
use super::member_io_status::MemberIoStatus;

/// Why a member is contacted during a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadCause {
    /// Only confirms membership and quorum, returns no data
    Check,
    /// The single member whose data answers the read
    Fetch,
}

/// One member taking part in an I/O round.
///
/// Identity is `(instance_id, endpoint)`; status and read cause are
/// per-round annotations and do not take part in equality.
#[derive(Debug, Clone)]
pub struct IoMember {
    instance_id: InstanceId,
    endpoint: EndPoint,
    member_io_status: MemberIoStatus,
    read_cause: Option<ReadCause>,
}

impl IoMember {
    pub fn new(instance_id: InstanceId, endpoint: EndPoint, member_io_status: MemberIoStatus) -> Self {
        Self {
            instance_id,
            endpoint,
            member_io_status,
            read_cause: None,
        }
    }

    /// Same member, contacted for the given read purpose.
    pub fn with_read_cause(mut self, cause: ReadCause) -> Self {
        self.read_cause = Some(cause);
        self
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn endpoint(&self) -> &EndPoint {
        &self.endpoint
    }

    pub fn member_io_status(&self) -> MemberIoStatus {
        self.member_io_status
    }

    pub fn read_cause(&self) -> Option<ReadCause> {
        self.read_cause
    }

    pub fn is_check_read(&self) -> bool {
        self.read_cause == Some(ReadCause::Check)
    }

    pub fn is_fetch_read(&self) -> bool {
        self.read_cause == Some(ReadCause::Fetch)
    }
}

impl PartialEq for IoMember {
    fn eq(&self, other: &Self) -> bool {
        self.instance_id == other.instance_id && self.endpoint == other.endpoint
    }
}

impl Eq for IoMember {}

impl Hash for IoMember {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instance_id.hash(state);
        self.endpoint.hash(state);
    }
}

impl fmt::Display for IoMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IoMember{{instance={}, endpoint={}, status={}, readCause={:?}}}",
            self.instance_id, self.endpoint, self.member_io_status, self.read_cause
        )
    }
}

/// Good secondaries of a read, split by what they were asked to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecondariesCountInfo {
    fetch_count: u32,
    check_count: u32,
}

impl SecondariesCountInfo {
    pub fn new(fetch_count: u32, check_count: u32) -> Self {
        Self {
            fetch_count,
            check_count,
        }
    }

    pub fn add_fetch_count(&mut self) {
        self.fetch_count += 1;
    }

    pub fn add_check_count(&mut self) {
        self.check_count += 1;
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch_count
    }

    pub fn check_count(&self) -> u32 {
        self.check_count
    }

    pub fn all_secondaries_count(&self) -> u32 {
        self.fetch_count + self.check_count
    }
}
