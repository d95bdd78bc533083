//! File-backed [`ClientStore`] for desktop and CLI clients.

// std
use std::{
	fs::{self, File, OpenOptions},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{ClientStore, StoreError, StoreFuture},
};

type Entries = BTreeMap<String, String>;

/// Keeps every entry in one JSON object file, rewritten after each mutation.
///
/// A rewrite lands in a sibling `.tmp` file that is flushed to disk and then renamed over the
/// target. Readers of the file therefore see the old or the new snapshot, never a mix. The
/// in-memory view only changes once the file has been replaced, so a failed write can be
/// retried.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	entries: Arc<RwLock<Entries>>,
}
impl FileStore {
	/// Opens the snapshot at `path`, creating parent directories as needed.
	///
	/// A missing or blank file opens as an empty store; anything else must be a JSON object
	/// of string values.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		create_parent(&path)?;

		let entries = read_entries(&path)?;

		Ok(Self { path, entries: Arc::new(RwLock::new(entries)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn flush(&self, entries: &Entries) -> Result<(), StoreError> {
		let json = serde_json::to_vec_pretty(entries).map_err(|e| StoreError::Serialization {
			message: format!("Cannot encode the session snapshot: {e}"),
		})?;

		replace_file(&self.path, &json)
	}
}
impl ClientStore for FileStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let value = self.entries.read().get(key).cloned();

		Box::pin(async move { Ok(value) })
	}

	fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut entries = self.entries.write();

			if entries.get(key) == Some(&value) {
				return Ok(());
			}

			let mut staged = entries.clone();

			staged.insert(key.to_owned(), value);
			self.flush(&staged)?;
			*entries = staged;

			Ok(())
		})
	}

	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut entries = self.entries.write();

			if !entries.contains_key(key) {
				return Ok(());
			}

			let mut staged = entries.clone();

			staged.remove(key);
			self.flush(&staged)?;
			*entries = staged;

			Ok(())
		})
	}
}

fn backend(action: &str, path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
	let context = format!("Cannot {action} {}", path.display());

	move |e| StoreError::Backend { message: format!("{context}: {e}") }
}

fn create_parent(path: &Path) -> Result<(), StoreError> {
	match path.parent() {
		Some(dir) if !dir.as_os_str().is_empty() =>
			fs::create_dir_all(dir).map_err(backend("create directory", dir)),
		_ => Ok(()),
	}
}

fn read_entries(path: &Path) -> Result<Entries, StoreError> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
		Err(e) => return Err(backend("read", path)(e)),
	};

	if raw.trim().is_empty() {
		return Ok(Entries::new());
	}

	serde_json::from_str(&raw).map_err(|e| StoreError::Serialization {
		message: format!("{} is not a session snapshot: {e}", path.display()),
	})
}

fn replace_file(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
	let staging = path.with_extension("tmp");
	let mut file: File = OpenOptions::new()
		.write(true)
		.create(true)
		.truncate(true)
		.open(&staging)
		.map_err(backend("open", &staging))?;

	file.write_all(contents).map_err(backend("write", &staging))?;
	file.sync_all().map_err(backend("flush", &staging))?;
	drop(file);

	fs::rename(&staging, path).map_err(backend("move into place", path))
}
