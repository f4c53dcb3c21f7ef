//! SeaORM entity models
//!
//! Database entities for FitCore

mod audit_record;
mod chat_history;
mod chat_session;
mod kb_chunk;
mod kb_source;
mod program_assignment;
mod site_setting;
mod training_program;
mod user;

pub use user::{
    ActiveModel as UserActiveModel,
    Column as UserColumn,
    Entity as UserEntity,
    Model as User,
    UserRole,
};

pub use chat_session::{
    ActiveModel as ChatSessionActiveModel,
    Column as ChatSessionColumn,
    Entity as ChatSessionEntity,
    Model as ChatSession,
};

pub use chat_history::{
    ActiveModel as ChatHistoryActiveModel,
    Column as ChatHistoryColumn,
    Entity as ChatHistoryEntity,
    Model as ChatTurn,
};

pub use site_setting::{
    ActiveModel as SiteSettingActiveModel,
    Column as SiteSettingColumn,
    Entity as SiteSettingEntity,
    Model as SiteSetting,
};

pub use kb_source::{
    ActiveModel as KbSourceActiveModel,
    Column as KbSourceColumn,
    Entity as KbSourceEntity,
    Model as KbSource,
};

pub use kb_chunk::{
    ActiveModel as KbChunkActiveModel,
    Column as KbChunkColumn,
    Entity as KbChunkEntity,
    Model as KbChunk,
};

pub use training_program::{
    ActiveModel as TrainingProgramActiveModel,
    Column as TrainingProgramColumn,
    Entity as TrainingProgramEntity,
    Model as TrainingProgram,
};

pub use program_assignment::{
    ActiveModel as ProgramAssignmentActiveModel,
    Column as ProgramAssignmentColumn,
    Entity as ProgramAssignmentEntity,
    Model as ProgramAssignment,
};

pub use audit_record::{
    ActiveModel as AuditRecordActiveModel,
    Column as AuditRecordColumn,
    Entity as AuditRecordEntity,
    Model as AuditRecord,
};
