use soroban_sdk::contracterror;

/// Error codes returned by the sarcophagus contract.
///
/// Every error aborts the invocation; the host discards all storage writes
/// and token movements made earlier in the same call.
///
/// # Code ranges
/// | Range   | Purpose                                |
/// |---------|----------------------------------------|
/// | 1 – 9   | Lifecycle / initialisation / config    |
/// | 10 – 19 | Authorisation & sender checks          |
/// | 20 – 29 | Resource not found                     |
/// | 30 – 49 | Validation / input                     |
/// | 50 – 69 | Sarcophagus state & timing             |
/// | 70 – 79 | Bond ledger                            |
/// | 80 – 89 | Signatures & commitments               |
/// | 90 – 99 | External value transfer                |
/// | 100     | Invariant violation (logic bug)        |
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum SarcophagusError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    InvalidConfig = 3,

    // ── Authorisation (10–19) ────────────────────────────────
    Unauthorized = 10,
    SenderNotEmbalmer = 11,
    SenderNotAuthorizedToClean = 12,

    // ── Not found (20–29) ────────────────────────────────────
    SarcophagusDoesNotExist = 20,
    ArchaeologistProfileNotFound = 21,
    ArchaeologistNotOnSarcophagus = 22,

    // ── Validation (30–49) ───────────────────────────────────
    InvalidAmount = 30,
    InvalidThreshold = 31,
    NoArchaeologistsProvided = 32,
    ArchaeologistListNotUnique = 33,
    ArchaeologistAlreadyRegistered = 34,
    DiggingFeeTooLow = 35,
    MaxRewrapIntervalExceedsArchaeologistMax = 36,
    RewrapIntervalTooLarge = 37,
    FeeMismatch = 38,
    DuplicateSarcophagusId = 39,
    ArchaeologistAlreadyOnSarcophagus = 40,
    CursedBondOutstanding = 41,
    PayloadRefAlreadyUsed = 42,

    // ── Sarcophagus state & timing (50–69) ───────────────────
    SarcophagusNotPending = 50,
    SarcophagusNotFinalized = 51,
    SarcophagusNotActive = 52,
    SarcophagusInactive = 53,
    SarcophagusCompromised = 54,
    ResurrectionTimeInPast = 55,
    TooEarlyToUnwrap = 56,
    TooLateToUnwrap = 57,
    ArchaeologistAlreadyUnwrapped = 58,
    ArchaeologistAlreadyAccused = 59,
    TooEarlyToClean = 60,
    NewResurrectionTimeNotLater = 61,
    AccusalWindowClosed = 62,

    // ── Bond ledger (70–79) ──────────────────────────────────
    InsufficientFreeBond = 70,
    NoRewardsToWithdraw = 71,

    // ── Signatures & commitments (80–89) ─────────────────────
    SignatureMismatch = 80,
    SignerNotArchaeologistOnSarcophagus = 81,
    UnencryptedShardHashMismatch = 82,

    // ── External value transfer (90–99) ──────────────────────
    FailedTransfer = 90,

    InvariantViolation = 100,
}
