mod notes;

pub use notes::NoteRepository;
