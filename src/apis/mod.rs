pub mod imdb_detail;
pub mod imdb_search;
pub mod kino;
pub mod tmdb;
