// Entities of the MS stack, as they exchange primitives through the MessageRouter
#[derive(PartialEq, Eq, Hash, Clone, Debug, Copy)]
pub enum GsmEntity {
    /// Physical layer (burst level)
    Phy,
    /// Layer 1 main-loop bridge, fronting the tick-context L1Sync
    L1,
    /// LAPDm data link layer
    Lapdm,
    /// Radio Resource management, consumer of SAPI 0
    Rr,
    /// Short message service, consumer of SAPI 3
    Sms,

    /// Any other upper layer user
    User,
}
