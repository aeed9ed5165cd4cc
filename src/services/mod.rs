// Analyzers and the dashboard orchestrator

pub mod statistics;
pub mod muscle_balance_service;
pub mod progression_service;
pub mod strength_ratio_service;
pub mod volume_distribution_service;
pub mod frequency_service;
pub mod personal_records_service;
pub mod fitness_score_service;
pub mod analytics_service;

pub use muscle_balance_service::MuscleBalanceService;
pub use progression_service::ProgressionService;
pub use strength_ratio_service::StrengthRatioService;
pub use volume_distribution_service::VolumeDistributionService;
pub use frequency_service::FrequencyService;
pub use personal_records_service::PersonalRecordsService;
pub use fitness_score_service::FitnessScoreService;
pub use analytics_service::AnalyticsService;
