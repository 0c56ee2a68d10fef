pub mod m202410010001_create_groups;
pub mod m202410010002_create_students;
pub mod m202410010003_create_assignments;
pub mod m202410010004_create_submissions;
