/*!
 * Synchronization Primitives
 *
 * The explicit reentrant lock underpinning hazard detection: ownership is
 * tracked by thread identity rather than ambient monitor state, so the
 * loader can ask "do I already hold this?" and can fully release and later
 * restore a held lock around nested work.
 */

mod reentrant;

pub use reentrant::{Hold, ReentrantLock};
