pub mod directory;
pub mod repository;
pub mod schedule;
pub mod storage;
pub mod supabase_store;

pub use directory::{DirectoryClient, DirectorySearch};
pub use repository::{InMemoryScheduleRepository, ScheduleRepository};
pub use schedule::{NameMatchPolicy, ScheduleSettings, ScheduleStore};
pub use supabase_store::SupabaseScheduleRepository;
