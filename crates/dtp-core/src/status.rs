use core::fmt;

/// A 4-byte DTP status code.
///
/// ## Wire Contract
/// Every connection is answered with exactly one of these, in network byte order.
/// The high bit marks a failure, so application codes such as `0x8000_0001`
/// read as failures to any client that follows the convention.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct StatusCode(u32);

static_assertions::assert_eq_size!(StatusCode, [u8; 4]);

impl StatusCode {
    /// Operation succeeded.
    pub const SUCCESS: Self = Self(0x0000_0000);
    /// Generic operation failed. Also answered when an endpoint panics.
    pub const FAIL: Self = Self(0x8000_0000);
    pub const NOT_INITIALIZED: Self = Self(0x8000_0001);
    pub const ALREADY_INITIALIZED: Self = Self(0x8000_0002);
    pub const THREAD_LAUNCH_FAILED: Self = Self(0x8000_0003);
    pub const OUT_OF_MEMORY: Self = Self(0x8000_0004);
    pub const SOCKET_CREATION_FAILED: Self = Self(0x8000_0005);
    pub const SOCKET_CONFIGURATION_FAILED: Self = Self(0x8000_0006);
    pub const SOCKET_BIND_FAILED: Self = Self(0x8000_0007);
    pub const SOCKET_LISTEN_FAILED: Self = Self(0x8000_0008);
    /// The service has already been stopped.
    pub const SERVICE_IS_STOPPED: Self = Self(0x8000_0009);
    /// No endpoint is registered for the packet tag.
    pub const UNKNOWN_PACKET_TAG: Self = Self(0x8000_000A);
    /// The packet is too short to carry a tag prefix.
    pub const MALFORMED_PACKET: Self = Self(0x8000_000B);
    pub const INVALID_CONFIGURATION: Self = Self(0x8000_000C);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// A code is a failure when its sign bit is set.
    pub const fn is_failure(self) -> bool {
        (self.0 as i32) < 0
    }

    /// Only `SUCCESS` counts as success; positive non-zero codes are informational.
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::SUCCESS => "Success",
            Self::FAIL => "Fail",
            Self::NOT_INITIALIZED => "NotInitialized",
            Self::ALREADY_INITIALIZED => "AlreadyInitialized",
            Self::THREAD_LAUNCH_FAILED => "ThreadLaunchFailed",
            Self::OUT_OF_MEMORY => "OutOfMemory",
            Self::SOCKET_CREATION_FAILED => "SocketCreationFailed",
            Self::SOCKET_CONFIGURATION_FAILED => "SocketConfigurationFailed",
            Self::SOCKET_BIND_FAILED => "SocketBindFailed",
            Self::SOCKET_LISTEN_FAILED => "SocketListenFailed",
            Self::SERVICE_IS_STOPPED => "ServiceIsStopped",
            Self::UNKNOWN_PACKET_TAG => "UnknownPacketTag",
            Self::MALFORMED_PACKET => "MalformedPacket",
            Self::INVALID_CONFIGURATION => "InvalidConfiguration",
            _ => return None,
        };
        Some(name)
    }
}

impl From<u32> for StatusCode {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<StatusCode> for u32 {
    fn from(status: StatusCode) -> Self {
        status.0
    }
}

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}({:#010x})", name, self.0),
            None => write!(f, "StatusCode({:#010x})", self.0),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
