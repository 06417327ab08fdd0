//! Buffered background writer.
//!
//! Callers push tiles into an unbounded channel and add their size to a shared byte counter.
//! A single consumer thread collects them into [`PendingWrites`] and writes the buffer in one
//! transaction as soon as the buffered bytes reach the threshold, or when it is shut down.
//! Callers yield their time slice while the counter is at or above the threshold.

use crate::{SchemaKind, pending::PendingWrites};
use anyhow::{Result, anyhow};
use crossbeam_channel::{Receiver, Sender, unbounded};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::{
	iter,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	thread::{self, JoinHandle},
};
use tessera_core::{Blob, TileCoord};
use tessera_derive::context;

static WRITER_ID: AtomicUsize = AtomicUsize::new(0);

enum WriterMessage {
	/// A tile in stored (TMS) row order.
	Tile(TileCoord, Blob),
	Shutdown,
}

pub struct TileWriter {
	sender: Sender<WriterMessage>,
	bytes: Arc<AtomicUsize>,
	threshold: usize,
	handle: Option<JoinHandle<Result<()>>>,
}

impl TileWriter {
	#[context("starting tile writer thread")]
	pub fn spawn(pool: Pool<SqliteConnectionManager>, schema: SchemaKind, threshold: usize) -> Result<TileWriter> {
		let (sender, receiver) = unbounded();
		let bytes = Arc::new(AtomicUsize::new(0));
		let consumer = Consumer {
			pool,
			schema,
			threshold,
			bytes: bytes.clone(),
			pending: PendingWrites::default(),
		};
		let id = WRITER_ID.fetch_add(1, Ordering::Relaxed);
		let handle = thread::Builder::new()
			.name(format!("mbtiles-tile-writer-{id:x}"))
			.spawn(move || consumer.run(&receiver))?;
		log::debug!("started tile writer {id:x} with a threshold of {threshold} bytes");

		Ok(TileWriter {
			sender,
			bytes,
			threshold,
			handle: Some(handle),
		})
	}

	/// Queue one tile. Yields the calling thread if the writer is behind.
	pub fn submit(&self, coord: TileCoord, data: Blob) -> Result<()> {
		let size = data.len();
		// counted before sending, so the consumer never subtracts bytes that were not added
		let buffered = self.bytes.fetch_add(size, Ordering::AcqRel) + size;
		if self.sender.send(WriterMessage::Tile(coord, data)).is_err() {
			self.bytes.fetch_sub(size, Ordering::AcqRel);
			return Err(anyhow!("tile writer has stopped"));
		}
		if buffered >= self.threshold {
			thread::yield_now();
		}
		Ok(())
	}

	/// Flush everything that is still buffered and wait for the thread to finish.
	/// Returns the first error the writer ran into.
	pub fn shutdown(mut self) -> Result<()> {
		self.stop()
	}

	fn stop(&mut self) -> Result<()> {
		let Some(handle) = self.handle.take() else {
			return Ok(());
		};
		// if the thread is already gone, join reports why
		let _ = self.sender.send(WriterMessage::Shutdown);
		handle.join().map_err(|_| anyhow!("tile writer thread panicked"))?
	}
}

impl Drop for TileWriter {
	fn drop(&mut self) {
		if let Err(err) = self.stop() {
			log::error!("tile writer failed: {err:#}");
		}
	}
}

struct Consumer {
	pool: Pool<SqliteConnectionManager>,
	schema: SchemaKind,
	threshold: usize,
	bytes: Arc<AtomicUsize>,
	pending: PendingWrites,
}

impl Consumer {
	fn run(mut self, receiver: &Receiver<WriterMessage>) -> Result<()> {
		let mut result = Ok(());
		while let Ok(first) = receiver.recv() {
			let mut shutdown = false;
			for message in iter::once(first).chain(receiver.try_iter()) {
				match message {
					WriterMessage::Tile(coord, data) => self.pending.insert(coord, data),
					WriterMessage::Shutdown => shutdown = true,
				}
			}

			log::trace!("{} tiles pending ({} bytes)", self.pending.len(), self.pending.bytes());

			if self.pending.bytes() >= self.threshold || (shutdown && !self.pending.is_empty()) {
				if let Err(err) = self.flush() {
					log::error!("failed to write buffered tiles: {err:#}");
					if result.is_ok() {
						result = Err(err);
					}
				}
			}
			if shutdown {
				break;
			}
		}
		result
	}

	#[context("flushing buffered tiles")]
	fn flush(&mut self) -> Result<()> {
		let bytes = self.pending.bytes();
		let tiles = self.pending.take();
		self.bytes.fetch_sub(bytes, Ordering::AcqRel);

		let mut conn = self.pool.get()?;
		let transaction = conn.transaction()?;
		for (coord, data) in &tiles {
			self.schema.set_tile(&transaction, coord, data.as_slice())?;
		}
		transaction.commit()?;
		log::trace!("wrote {} buffered tiles ({bytes} bytes)", tiles.len());
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pool() -> Result<Pool<SqliteConnectionManager>> {
		let pool = Pool::builder()
			.max_size(1)
			.build(SqliteConnectionManager::memory())?;
		SchemaKind::Flat.create_tables(&*pool.get()?, None)?;
		Ok(pool)
	}

	fn count(pool: &Pool<SqliteConnectionManager>) -> Result<i64> {
		Ok(pool.get()?.query_row("SELECT count(*) FROM tiles", [], |row| row.get(0))?)
	}

	#[test]
	fn shutdown_flushes_below_threshold() -> Result<()> {
		let pool = pool()?;
		let writer = TileWriter::spawn(pool.clone(), SchemaKind::Flat, 1 << 20)?;
		for x in 0..8 {
			writer.submit(TileCoord::new(3, x, 0)?, Blob::from(vec![7u8; 10]))?;
		}
		writer.shutdown()?;
		assert_eq!(count(&pool)?, 8);
		Ok(())
	}

	#[test]
	fn flushes_when_threshold_is_reached() -> Result<()> {
		let pool = pool()?;
		let writer = TileWriter::spawn(pool.clone(), SchemaKind::Flat, 16)?;
		for x in 0..64 {
			writer.submit(TileCoord::new(6, x, 1)?, Blob::from(vec![1u8; 32]))?;
		}
		writer.shutdown()?;
		assert_eq!(count(&pool)?, 64);
		Ok(())
	}

	#[test]
	fn byte_counter_never_exceeds_submitted_bytes() -> Result<()> {
		let pool = pool()?;
		let writer = TileWriter::spawn(pool.clone(), SchemaKind::Flat, 64)?;
		let mut submitted = 0;
		for x in 0..256 {
			writer.submit(TileCoord::new(8, x, 3)?, Blob::from(vec![2u8; 24]))?;
			submitted += 24;
			assert!(writer.bytes.load(Ordering::Acquire) <= submitted);
		}
		writer.shutdown()?;
		assert_eq!(count(&pool)?, 256);
		Ok(())
	}

	#[test]
	fn reports_write_errors() -> Result<()> {
		// no tables, every flush fails
		let pool = Pool::builder()
			.max_size(1)
			.build(SqliteConnectionManager::memory())?;
		let writer = TileWriter::spawn(pool, SchemaKind::Flat, 1)?;
		writer.submit(TileCoord::new(0, 0, 0)?, Blob::from(vec![0u8; 4]))?;
		assert!(writer.shutdown().is_err());
		Ok(())
	}
}
