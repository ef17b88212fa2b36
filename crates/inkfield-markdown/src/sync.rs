//! Bidirectional bridge between the structured value and the edit surface.
//!
//! The synchronizer owns the `StructuredValue` and is the sole writer of
//! its files list. It observes buffer changes through an explicitly
//! registered surface listener (no implicit reactivity) and re-emits the
//! value to subscribers after every user-visible edit. State shared with
//! the listener closure lives behind `Rc<RefCell<..>>`; the whole model is
//! single-threaded.

use std::cell::RefCell;
use std::rc::Rc;

use inkfield_editor_core::EditSurface;

use crate::marker::UploadedFile;
use crate::value::{FileId, FileRef, StructuredValue};

/// Subscriber invoked with the emitted value after each buffer change.
pub type InputListener = Box<dyn FnMut(&StructuredValue)>;

struct SyncShared {
    value: StructuredValue,
    next_file_id: u64,
}

/// Owner of the structured value, bridging it to an edit surface.
pub struct ValueSynchronizer {
    shared: Rc<RefCell<SyncShared>>,
    subscribers: Rc<RefCell<Vec<InputListener>>>,
}

impl Default for ValueSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueSynchronizer {
    /// Create a synchronizer holding an empty value.
    pub fn new() -> Self {
        Self {
            shared: Rc::new(RefCell::new(SyncShared {
                value: StructuredValue::default(),
                next_file_id: 0,
            })),
            subscribers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Register the buffer-change listener on `surface`.
    ///
    /// On every change the emitted value is recomputed as
    /// `{ text: <raw text>, files: <unchanged> }` and pushed to all
    /// subscribers, synchronously within the mutating call.
    pub fn attach<S: EditSurface>(&self, surface: &mut S) {
        let shared = Rc::clone(&self.shared);
        let subscribers = Rc::clone(&self.subscribers);
        surface.on_change(Box::new(move |text| {
            let snapshot = {
                let mut st = shared.borrow_mut();
                st.value.text.clear();
                st.value.text.push_str(text);
                st.value.clone()
            };
            notify(&subscribers, &snapshot);
        }));
    }

    /// Subscribe to emitted value updates.
    pub fn subscribe(&self, listener: InputListener) {
        self.subscribers.borrow_mut().push(listener);
    }

    /// Replace the owned value, assigning a fresh identity to every file.
    ///
    /// Identities come from a monotonic counter and are never reused, so
    /// re-seeding (external value swap, locale change) cannot alias old
    /// marker associations.
    pub fn seed(&self, mut value: StructuredValue) {
        let mut st = self.shared.borrow_mut();
        for file in &mut value.files {
            file.id = FileId(st.next_file_id);
            st.next_file_id += 1;
        }
        st.value = value;
    }

    /// Append an uploaded file to the files list, assigning its identity.
    ///
    /// This is the only append path; error settlements never call it.
    pub fn append_file(&self, uploaded: UploadedFile) -> FileRef {
        let mut st = self.shared.borrow_mut();
        let file = FileRef {
            id: FileId(st.next_file_id),
            name: uploaded.name,
            size: uploaded.size,
            extra: uploaded.extra,
        };
        st.next_file_id += 1;
        st.value.files.push(file.clone());
        file
    }

    /// Snapshot of the current value.
    pub fn value(&self) -> StructuredValue {
        self.shared.borrow().value.clone()
    }

    /// Snapshot of the current files list.
    pub fn files(&self) -> Vec<FileRef> {
        self.shared.borrow().value.files.clone()
    }

    /// Emit the current value without a buffer change.
    ///
    /// Used after an orphaned settlement: the file was recorded but no
    /// buffer rewrite happened, so no change notification fired.
    pub fn emit_current(&self) {
        let snapshot = self.value();
        notify(&self.subscribers, &snapshot);
    }
}

fn notify(subscribers: &Rc<RefCell<Vec<InputListener>>>, value: &StructuredValue) {
    // take the list so subscribers may themselves subscribe without a
    // double borrow
    let mut taken = std::mem::take(&mut *subscribers.borrow_mut());
    for sub in taken.iter_mut() {
        sub(value);
    }
    let mut guard = subscribers.borrow_mut();
    taken.append(&mut guard);
    *guard = taken;
}
