use anchor_lang::prelude::*;

#[error_code]
pub enum ParlayError {
    // Validation
    #[msg("Ticket must have between 2 and 5 legs")]
    InvalidLegCount,

    #[msg("Ticket references the same leg twice")]
    DuplicateLeg,

    #[msg("Chosen outcome count does not match leg count")]
    OutcomeCountMismatch,

    #[msg("Chosen outcome is not a legal sentinel")]
    InvalidOutcomeSentinel,

    #[msg("Probability must be within [1, PPM - 1]")]
    InvalidProbability,

    #[msg("Stake below the configured minimum")]
    StakeTooSmall,

    #[msg("Stake above the configured maximum")]
    StakeTooLarge,

    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Question text exceeds the stored length")]
    QuestionTooLong,

    #[msg("Cutoff or resolve time is not in the future")]
    InvalidLegTiming,

    #[msg("Invalid outcome for resolution")]
    InvalidOutcome,

    #[msg("Fee or penalty configuration out of range")]
    InvalidFeeConfig,

    #[msg("Math overflow")]
    MathOverflow,

    #[msg("Multiplier requires at least one leg")]
    NoLegs,

    #[msg("Supplied leg account does not match the ticket")]
    LegMismatch,

    // Policy
    #[msg("Ticket payout exceeds the per-ticket pool cap")]
    TicketTooLarge,

    #[msg("Reservation would exceed the pool utilization cap")]
    UtilizationCapExceeded,

    #[msg("Lock amount below the facility minimum")]
    LockBelowMinimum,

    #[msg("Ticket is not in the required state")]
    WrongTicketStatus,

    #[msg("Ticket payout mode does not permit this operation")]
    WrongPayoutMode,

    #[msg("Cashout requires at least one unresolved leg")]
    NothingUnresolved,

    #[msg("No won legs to value")]
    NoWonLegs,

    #[msg("A leg has already been lost")]
    LegAlreadyLost,

    #[msg("Nothing to claim")]
    NothingToClaim,

    #[msg("Leg is not active")]
    LegInactive,

    #[msg("Leg is past its cutoff time")]
    BettingClosed,

    #[msg("Proposal is not open for this action")]
    ProposalNotOpen,

    #[msg("Challenge window has closed")]
    ChallengeWindowClosed,

    #[msg("Proposer cannot challenge their own proposal")]
    ChallengerIsProposer,

    #[msg("Lock has already matured; use unlock")]
    LockMatured,

    #[msg("No surplus shares to sweep")]
    NoSweepableSurplus,

    // Authorization
    #[msg("Unauthorized")]
    Unauthorized,

    #[msg("Caller is not the ticket owner")]
    NotTicketOwner,

    #[msg("Caller is not the position owner")]
    NotPositionOwner,

    // Readiness
    #[msg("Leg outcome is not final")]
    OutcomeNotFinal,

    #[msg("Liveness window has not elapsed")]
    LivenessNotElapsed,

    #[msg("Lock has not matured")]
    LockNotMatured,

    #[msg("Leg cannot be resolved before its earliest resolve time")]
    ResolveTooEarly,

    // Finality
    #[msg("Already resolved")]
    AlreadyResolved,

    #[msg("Already claimed")]
    AlreadyClaimed,

    #[msg("Outcome already proposed")]
    AlreadyProposed,

    #[msg("Proposal already finalized")]
    AlreadyFinalized,

    // Liquidity
    #[msg("Insufficient free liquidity")]
    InsufficientLiquidity,

    // Slippage
    #[msg("Cashout value below the requested minimum")]
    SlippageExceeded,

    // Wiring
    #[msg("Lock facility is not configured")]
    LockFacilityNotConfigured,

    #[msg("Safety buffer is not configured")]
    SafetyVaultNotConfigured,

    #[msg("Required component reference is not configured")]
    NotConfigured,
}

/// The closed failure taxonomy. Every error variant maps to exactly one
/// kind; the UI treats a revert as a single categorized error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    InvalidArgument,
    PolicyViolation,
    Unauthorized,
    NotReady,
    AlreadyResolved,
    InsufficientLiquidity,
    Slippage,
    NotConfigured,
}

impl ParlayError {
    /// Error code as u32 for client-side handling.
    pub fn error_code(&self) -> u32 {
        (*self as u32) + 6000
    }

    pub fn kind(&self) -> FailureKind {
        use ParlayError::*;
        match self {
            InvalidLegCount | DuplicateLeg | OutcomeCountMismatch | InvalidOutcomeSentinel
            | InvalidProbability | StakeTooSmall | StakeTooLarge | ZeroAmount
            | QuestionTooLong | InvalidLegTiming | InvalidOutcome | InvalidFeeConfig
            | MathOverflow | NoLegs | LegMismatch => FailureKind::InvalidArgument,

            TicketTooLarge | UtilizationCapExceeded | LockBelowMinimum | WrongTicketStatus
            | WrongPayoutMode | NothingUnresolved | NoWonLegs | LegAlreadyLost
            | NothingToClaim | LegInactive | BettingClosed | ProposalNotOpen
            | ChallengeWindowClosed | ChallengerIsProposer | LockMatured
            | NoSweepableSurplus => FailureKind::PolicyViolation,

            Unauthorized | NotTicketOwner | NotPositionOwner => FailureKind::Unauthorized,

            OutcomeNotFinal | LivenessNotElapsed | LockNotMatured | ResolveTooEarly => {
                FailureKind::NotReady
            }

            AlreadyResolved | AlreadyClaimed | AlreadyProposed | AlreadyFinalized => {
                FailureKind::AlreadyResolved
            }

            InsufficientLiquidity => FailureKind::InsufficientLiquidity,

            SlippageExceeded => FailureKind::Slippage,

            LockFacilityNotConfigured | SafetyVaultNotConfigured | NotConfigured => {
                FailureKind::NotConfigured
            }
        }
    }

    /// Whether the caller can usefully retry without changing the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            FailureKind::NotReady | FailureKind::InsufficientLiquidity | FailureKind::Slippage
        )
    }

    pub fn is_validation_error(&self) -> bool {
        self.kind() == FailureKind::InvalidArgument
    }

    pub fn is_auth_error(&self) -> bool {
        self.kind() == FailureKind::Unauthorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ParlayError::InvalidLegCount;
        assert_eq!(err.error_code(), 6000);

        let err = ParlayError::SlippageExceeded;
        assert!(err.error_code() >= 6000 && err.error_code() < 7000);
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            ParlayError::DuplicateLeg.kind(),
            FailureKind::InvalidArgument
        );
        assert_eq!(
            ParlayError::UtilizationCapExceeded.kind(),
            FailureKind::PolicyViolation
        );
        assert_eq!(ParlayError::NotTicketOwner.kind(), FailureKind::Unauthorized);
        assert_eq!(ParlayError::OutcomeNotFinal.kind(), FailureKind::NotReady);
        assert_eq!(
            ParlayError::AlreadyClaimed.kind(),
            FailureKind::AlreadyResolved
        );
        assert_eq!(
            ParlayError::InsufficientLiquidity.kind(),
            FailureKind::InsufficientLiquidity
        );
        assert_eq!(ParlayError::SlippageExceeded.kind(), FailureKind::Slippage);
        assert_eq!(
            ParlayError::LockFacilityNotConfigured.kind(),
            FailureKind::NotConfigured
        );
    }

    #[test]
    fn test_error_categories() {
        assert!(ParlayError::SlippageExceeded.is_recoverable());
        assert!(ParlayError::LivenessNotElapsed.is_recoverable());
        assert!(!ParlayError::InvalidLegCount.is_recoverable());

        assert!(ParlayError::StakeTooSmall.is_validation_error());
        assert!(!ParlayError::Unauthorized.is_validation_error());

        assert!(ParlayError::Unauthorized.is_auth_error());
        assert!(!ParlayError::StakeTooSmall.is_auth_error());
    }
}
