/// TS 04.06 clause 2.1 frame formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LapdmFormat {
    /// Address, control and length field, no information field
    A,
    /// Address, control and length field, with information field
    B,
    /// Information field only (BCCH, PCH, AGCH)
    Bbis,
    /// Address and control field only, used for UI frames on SACCH
    B4,
}

impl LapdmFormat {
    /// Whether frames of this format carry a length indicator field
    pub fn has_length(self) -> bool {
        matches!(self, LapdmFormat::A | LapdmFormat::B)
    }

    /// Whether frames of this format carry address and control fields
    pub fn has_header(self) -> bool {
        !matches!(self, LapdmFormat::Bbis)
    }
}

impl core::fmt::Display for LapdmFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LapdmFormat::A => write!(f, "A"),
            LapdmFormat::B => write!(f, "B"),
            LapdmFormat::Bbis => write!(f, "Bbis"),
            LapdmFormat::B4 => write!(f, "B4"),
        }
    }
}
