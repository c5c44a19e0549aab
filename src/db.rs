pub mod user_repo;
pub use user_repo::UserRepository;
pub mod shop_repo;
pub use shop_repo::ShopRepository;
pub mod schedule_repo;
pub use schedule_repo::ScheduleRepository;
pub mod booking_repo;
pub use booking_repo::BookingRepository;

pub mod storage;
pub use storage::Storage;
pub mod pg_storage;
pub use pg_storage::PgStorage;
pub mod memory;
pub use memory::InMemoryStorage;
