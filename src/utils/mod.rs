pub mod schedule;
pub mod time;

/// Generates a random 21 character id.
pub fn longid() -> String {
    nanoid::nanoid!()
}

/// Generates a random 10 character id, used for node ids inside a graph.
pub fn shortid() -> String {
    nanoid::nanoid!(10)
}
