//! Helper to give each test its own hdf5 file path and tidy it up afterwards.
use std::{
    env::temp_dir,
    ops::Deref,
    path::{Path, PathBuf},
};

// Suitably long temp file name, unlikely to clash with anything else
const TEMP_FILE_PREFIX: &str = "temp_fixture_writer_file";

pub(crate) struct OneTempFile(PathBuf);

impl OneTempFile {
    //  We need a different file for each test, so they can run in parallel
    pub(crate) fn new(test_name: &str) -> Self {
        let mut path = temp_dir();
        path.push(format!("{TEMP_FILE_PREFIX}_{test_name}.hdf5"));
        Self(path)
    }
}

//  Cleans up the temp directory after our test
impl Drop for OneTempFile {
    fn drop(&mut self) {
        if self.0.exists() {
            std::fs::remove_file(&self.0).unwrap();
        }
    }
}

impl Deref for OneTempFile {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
