pub mod episodes;
pub mod photos;
pub mod seasons;
pub mod shows;
