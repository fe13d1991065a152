// Adapters layer: concrete implementations for external systems (Google auth, Firestore REST).

pub mod credentials;
pub mod firestore;
