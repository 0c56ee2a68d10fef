mod grade_test;
mod submissions_test;
mod upload_test;
