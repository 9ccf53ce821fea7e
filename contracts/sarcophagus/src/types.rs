use soroban_sdk::{contracttype, Address, Bytes, BytesN, String, Vec};

/// Basis-point denominator used by fee and slashing percentages.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Resurrection time assigned to a buried or cancelled sarcophagus.
pub const NEVER_RESURRECT: u64 = u64::MAX;

// ── Archaeologists ───────────────────────────────────────────────────────────

/// Registration record and bond accounting for one archaeologist.
///
/// `free_bond` is withdrawable collateral; `cursed_bond` is collateral locked
/// against the digging fees of every sarcophagus the archaeologist currently
/// guards. The ledger keeps a single aggregate per archaeologist, not one
/// escrow per sarcophagus.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArchaeologistProfile {
    pub exists: bool,
    /// Opaque contact handle used for off-chain coordination.
    pub peer_id: String,
    /// Uncompressed secp256k1 public key (`0x04 || x || y`) the archaeologist
    /// signs curse terms and hand-overs with.
    pub signing_key: BytesN<65>,
    pub minimum_digging_fee: i128,
    pub maximum_rewrap_interval: u64,
    pub free_bond: i128,
    pub cursed_bond: i128,
    pub rewards: i128,
    pub successes: u32,
    pub accusals: u32,
}

// ── Sarcophagi ───────────────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum SarcophagusState {
    Pending = 0,
    Active = 1,
    Done = 2,
    Compromised = 3,
}

/// Lifecycle phase derived from the stored state and the ledger clock.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum LifecyclePhase {
    Pending = 0,
    Active = 1,
    /// Between the resurrection time and the end of the grace period.
    Resurrecting = 2,
    /// Grace period over, defaulting archaeologists not yet cleaned up.
    AwaitingClean = 3,
    Done = 4,
    Compromised = 5,
}

/// Terms an embalmer proposes for one archaeologist at creation time.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArchaeologistTerms {
    pub archaeologist: Address,
    /// Digest of the key share this archaeologist will hold.
    pub share_digest: BytesN<32>,
    pub digging_fee: i128,
}

/// One archaeologist's slot on a sarcophagus.
///
/// `published` and `accused` are mutually exclusive.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CursedArchaeologist {
    pub archaeologist: Address,
    pub share_digest: BytesN<32>,
    pub digging_fee: i128,
    pub published_share: Option<Bytes>,
    pub published: bool,
    pub accused: bool,
}

impl CursedArchaeologist {
    pub fn from_terms(terms: &ArchaeologistTerms) -> Self {
        CursedArchaeologist {
            archaeologist: terms.archaeologist.clone(),
            share_digest: terms.share_digest.clone(),
            digging_fee: terms.digging_fee,
            published_share: None,
            published: false,
            accused: false,
        }
    }

    /// True while this slot still holds a claim on the archaeologist's cursed bond.
    pub fn is_bonded(&self) -> bool {
        !self.published && !self.accused
    }
}

/// Creation parameters for a sarcophagus.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SarcophagusParams {
    pub name: String,
    pub salt: BytesN<32>,
    pub recipient: Address,
    pub resurrection_time: u64,
    pub maximum_rewrap_interval: u64,
    pub threshold: u32,
    /// Must equal the sum of digging fees plus the protocol fee.
    pub total_fee: i128,
    /// Storage location of the encrypted payload.
    pub payload_ref: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sarcophagus {
    pub id: BytesN<32>,
    pub name: String,
    pub embalmer: Address,
    pub recipient: Address,
    pub resurrection_time: u64,
    pub previous_rewrap_time: u64,
    pub maximum_rewrap_interval: u64,
    pub threshold: u32,
    pub archaeologists: Vec<CursedArchaeologist>,
    /// Append-only; a transfer adds the new holder's payload copy.
    pub payload_refs: Vec<String>,
    pub state: SarcophagusState,
    pub compromised: bool,
    pub accused_count: u32,
    /// Fees paid by the embalmer and not yet paid out or refunded.
    pub fee_escrow: i128,
    pub created_at: u64,
}

impl Sarcophagus {
    pub fn total_archaeologists(&self) -> u32 {
        self.archaeologists.len()
    }

    pub fn position_of(&self, archaeologist: &Address) -> Option<u32> {
        self.archaeologists
            .iter()
            .position(|slot| slot.archaeologist == *archaeologist)
            .map(|index| index as u32)
    }

    /// Last second at which key shares may still be published.
    pub fn grace_end(&self, grace_period: u64) -> u64 {
        self.resurrection_time.saturating_add(grace_period)
    }
}

/// An archaeologist's recoverable signature (`r || s || v`) over the curse
/// terms of its slot.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArchaeologistSignature {
    pub archaeologist: Address,
    pub signature: BytesN<65>,
}

// ── Protocol configuration ───────────────────────────────────────────────────

/// How a slashed bond is divided between the accuser and the embalmer.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlashPolicy {
    /// Share paid to the accuser; the embalmer receives the remainder.
    pub accuser_bps: u32,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum BuryPolicy {
    /// Burying fails once the resurrection time is reached.
    BeforeResurrection = 0,
    /// Burying is allowed until the grace period ends.
    BeforeGraceExpiry = 1,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum DigestAlgorithm {
    Keccak256 = 0,
    Sha256 = 1,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProtocolConfig {
    /// Charged to the embalmer on top of the digging fees.
    pub protocol_fee_bps: u32,
    pub grace_period: u64,
    /// After the grace period, how long only the embalmer may clean.
    pub expiration_threshold: u64,
    pub slash_policy: SlashPolicy,
    pub bury_policy: BuryPolicy,
    pub digest: DigestAlgorithm,
}

impl ProtocolConfig {
    pub fn default_config() -> Self {
        ProtocolConfig {
            protocol_fee_bps: 100,
            grace_period: 3_600,
            expiration_threshold: 3_600,
            slash_policy: SlashPolicy { accuser_bps: 5_000 },
            bury_policy: BuryPolicy::BeforeResurrection,
            digest: DigestAlgorithm::Keccak256,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.protocol_fee_bps <= BPS_DENOMINATOR
            && self.slash_policy.accuser_bps <= BPS_DENOMINATOR
    }

    pub fn protocol_fee(&self, digging_fees: i128) -> i128 {
        digging_fees * self.protocol_fee_bps as i128 / BPS_DENOMINATOR as i128
    }
}
