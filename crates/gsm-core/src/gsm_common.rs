/// Service access point identifier as exchanged with layer 3: (subsystem << 24) | sap_code
pub type SapId = u32;

/// Subsystem codes, upper octet of a SapId
pub const SUBSYS_CONTROL: u32 = 0;
pub const SUBSYS_L1: u32 = 1;
pub const SUBSYS_L2: u32 = 2;

// SAPs between the layers of the MS stack
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Sap {
    /// L1/PHY and L1/LAPDm data, PH-DATA and PH-RACH
    PhSap,
    /// L1 management, task control and clock
    MphSap,

    /// LAPDm/L3, RSLms radio link layer primitives
    DlSap,
    /// LAPDm management, error reporting
    MdlSap,

    /// Custom SAP for inter-entity control messages
    Control,
}

impl Sap {
    pub fn subsystem(&self) -> u32 {
        match self {
            Sap::PhSap | Sap::MphSap => SUBSYS_L1,
            Sap::DlSap | Sap::MdlSap => SUBSYS_L2,
            Sap::Control => SUBSYS_CONTROL,
        }
    }

    pub fn sap_code(&self) -> u32 {
        match self {
            Sap::PhSap => 1,
            Sap::MphSap => 2,
            Sap::DlSap => 1,
            Sap::MdlSap => 2,
            Sap::Control => 0,
        }
    }

    pub fn sap_id(&self) -> SapId {
        (self.subsystem() << 24) | self.sap_code()
    }

    pub fn from_sap_id(id: SapId) -> Option<Sap> {
        [Sap::PhSap, Sap::MphSap, Sap::DlSap, Sap::MdlSap, Sap::Control]
            .into_iter()
            .find(|sap| sap.sap_id() == id)
    }
}

/// Operation carried by a primitive
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrimOp {
    Request,
    Response,
    Indication,
    Confirm,
}

impl PrimOp {
    /// True for primitives travelling down the stack
    pub fn is_downward(&self) -> bool {
        matches!(self, PrimOp::Request | PrimOp::Response)
    }
}

impl core::fmt::Display for PrimOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PrimOp::Request => write!(f, "req"),
            PrimOp::Response => write!(f, "resp"),
            PrimOp::Indication => write!(f, "ind"),
            PrimOp::Confirm => write!(f, "conf"),
        }
    }
}
