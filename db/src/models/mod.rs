pub mod assignment;
pub mod group;
pub mod student;
pub mod submission;

pub use assignment::Entity as Assignment;
pub use group::Entity as Group;
pub use student::Entity as Student;
pub use submission::Entity as Submission;
