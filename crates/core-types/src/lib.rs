pub mod challenge;
pub mod competition;
pub mod enums;
pub mod error;
pub mod requests;
pub mod season;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use competition::{CompetitionGroupFilter, CountryCompetitions};
pub use enums::{ChallengeStatus, CompetitionType, UserRole};
pub use error::CoreError;
pub use season::season_for_date;
pub use structs::{
    CareerStint, Challenge, ChallengeGoal, Competition, CompetitionGroup, CompetitionGroupDetail,
    Country, Game, Save, SaveChallenge, SaveDetail, Season, Team, Trophy, User,
};
