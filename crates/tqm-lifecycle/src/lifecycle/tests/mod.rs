mod common;
mod department;
mod router;
