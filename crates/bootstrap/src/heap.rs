//! JVM heap sizing.
//!
//! The heap is half of the instance memory, rounded up to whole GiB, and
//! never above 32 GiB so the JVM keeps compressed object pointers.

/// Largest heap handed to the engine, in GiB.
pub const MAX_HEAP_GIB: u64 = 32;

/// Heap size in GiB for an instance with `total_memory_gib` of memory.
///
/// Computes `floor((total + 1) / 2)`, capped at [`MAX_HEAP_GIB`].
pub fn heap_size_gib(total_memory_gib: u64) -> u64 {
    (total_memory_gib.saturating_add(1) / 2).min(MAX_HEAP_GIB)
}

/// Shell snippet rewriting the min/max heap lines of `jvm.options`.
///
/// With a known size the value is fixed; otherwise the instance measures
/// its own memory and applies the same formula.
pub(crate) fn rewrite_command(fixed_gib: Option<u64>) -> String {
    let size = match fixed_gib {
        Some(gib) => format!("heap_gib={gib}\n"),
        None => format!(
            "total_mem=$(( $(free -g | awk '/^Mem:/ {{ print $2 }}') + 1 ))\n\
             heap_gib=$(( total_mem / 2 ))\n\
             if [ \"$heap_gib\" -ge {MAX_HEAP_GIB} ]; then heap_gib={MAX_HEAP_GIB}; fi\n"
        ),
    };

    format!(
        "{size}\
         sed -i -e \"s/^-Xms[0-9a-z]*$/-Xms${{heap_gib}}g/g\" config/jvm.options\n\
         sed -i -e \"s/^-Xmx[0-9a-z]*$/-Xmx${{heap_gib}}g/g\" config/jvm.options"
    )
}
