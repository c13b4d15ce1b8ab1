//! # Kernel Entry Point
//!
//! Boots the kernel services against an in-memory disk and runs a short
//! concurrent workload over both managers, the way the file system and the
//! virtual memory layer would use them.

use kernel::{BootConfig, Kernel, init_console};
use kernel_bio::{BlockDevice, BlockId, RamDisk};
use kernel_console::console_trace;
use kernel_info::param::ROOTDEV;
use log::{error, info, warn};
use std::process::ExitCode;
use std::thread;

/// Concurrent "processes" in the smoke workload.
const WORKERS: u32 = 4;

/// Rounds each worker runs.
const ROUNDS: u32 = 64;

/// Blocks the workload touches; more than the cache holds, so buffers get recycled.
const BLOCKS: u32 = 40;

/// Block number of the superblock.
const SUPERBLOCK: u32 = 1;

fn main() -> ExitCode {
    let config = BootConfig::default();
    if let Err(e) = init_console(config.log_level) {
        console_trace!("console: {e}\n");
    }

    let kernel = match Kernel::boot(&config, RamDisk::new()) {
        Ok(kernel) => kernel,
        Err(e) => {
            error!("Boot failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    kernel_main(&kernel);
    ExitCode::SUCCESS
}

fn kernel_main<D: BlockDevice>(kernel: &Kernel<D>) {
    let bcache = kernel.bcache();
    let pages = kernel.pages();

    // Keep the superblock resident for the whole run.
    let superblock = bcache.read(BlockId::new(ROOTDEV, SUPERBLOCK));
    let pin = bcache.pin(&superblock);
    bcache.release(superblock);

    thread::scope(|s| {
        for worker in 0..WORKERS {
            s.spawn(move || {
                for round in 0..ROUNDS {
                    let blockno = 2 + (worker * 7 + round) % BLOCKS;
                    let mut buf = bcache.read(BlockId::new(ROOTDEV, blockno));
                    let data = buf.data_mut();
                    data[0] = data[0].wrapping_add(1);
                    bcache.commit(&buf);
                    bcache.release(buf);

                    // Share a page between a "parent" and a "child", then let both go.
                    match pages.allocate() {
                        Ok(page) => {
                            pages.increment(page);
                            pages.free(page);
                            pages.free(page);
                        }
                        Err(e) => warn!("worker {worker}: {e}"),
                    }
                }
            });
        }
    });

    bcache.unpin(pin);

    let stats = bcache.stats();
    info!(
        "Buffer cache: {} hits, {} misses, {} taken from other buckets",
        stats.hits, stats.misses, stats.foreign_recycles
    );
    match bcache.audit() {
        Ok(sizes) => info!("Buffer cache buckets: {sizes:?}"),
        Err(e) => error!("Buffer cache audit failed: {e}"),
    }
    info!(
        "Page allocator: {}/{} pages free",
        pages.free_pages(),
        pages.total_pages()
    );
}
