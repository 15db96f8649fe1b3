use crate::model::*;

// Movie keys are big-endian so that iterating the tree in key order walks
// ids in the order they were generated, i.e. insertion order.
fn serialize_id(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

fn deserialize_id<V: AsRef<[u8]>>(id: V) -> u64 {
    use std::convert::TryInto;
    u64::from_be_bytes(id.as_ref().try_into().unwrap())
}

const USER: &'static [u8] = b"user";
const USER_KEY: &'static [u8] = b"owner";
const MOVIES: &'static [u8] = b"movies";

/// Access to the single stored account. The application never holds more
/// than one user, so the record lives under a fixed key instead of an
/// id-indexed tree.
pub trait UserDb {
    type Error;
    fn put_user(&self, user: &User) -> Result<(), Self::Error>;
    fn get_user(&self) -> Result<Option<User>, Self::Error>;
}

impl UserDb for sled::Db {
    type Error = sled::Error;

    fn put_user(&self, user: &User) -> sled::Result<()> {
        let users = self.open_tree(USER)?;
        users.insert(USER_KEY, bincode::serialize(user).unwrap())?;
        Ok(())
    }

    fn get_user(&self) -> sled::Result<Option<User>> {
        let users = self.open_tree(USER)?;
        Ok(users
            .get(USER_KEY)?
            .map(|d| bincode::deserialize(&d).unwrap()))
    }
}

pub trait MovieDb {
    type Error;
    fn add_movie(&self, movie: &Movie) -> Result<u64, Self::Error>;
    fn get_movie(&self, id: u64) -> Result<Option<Movie>, Self::Error>;
    /// Overwrites an existing record. Returns `false` if the id is unknown.
    fn update_movie(&self, id: u64, movie: &Movie) -> Result<bool, Self::Error>;
    /// Returns `false` if the id is unknown.
    fn delete_movie(&self, id: u64) -> Result<bool, Self::Error>;
    /// All movies in insertion order.
    fn list_movies(&self) -> Result<Vec<(u64, Movie)>, Self::Error>;
}

impl MovieDb for sled::Db {
    type Error = sled::Error;

    fn add_movie(&self, movie: &Movie) -> sled::Result<u64> {
        let movies = self.open_tree(MOVIES)?;
        let id = self.generate_id()?;
        movies.insert(serialize_id(id), bincode::serialize(movie).unwrap())?;
        Ok(id)
    }

    fn get_movie(&self, id: u64) -> sled::Result<Option<Movie>> {
        let movies = self.open_tree(MOVIES)?;
        Ok(movies
            .get(serialize_id(id))?
            .map(|d| bincode::deserialize(&d).unwrap()))
    }

    fn update_movie(&self, id: u64, movie: &Movie) -> sled::Result<bool> {
        let movies = self.open_tree(MOVIES)?;
        if movies.get(serialize_id(id))?.is_none() {
            return Ok(false);
        }
        movies.insert(serialize_id(id), bincode::serialize(movie).unwrap())?;
        Ok(true)
    }

    fn delete_movie(&self, id: u64) -> sled::Result<bool> {
        let movies = self.open_tree(MOVIES)?;
        Ok(movies.remove(serialize_id(id))?.is_some())
    }

    fn list_movies(&self) -> sled::Result<Vec<(u64, Movie)>> {
        let movies = self.open_tree(MOVIES)?;
        movies
            .iter()
            .map(|entry| {
                let (key, value) = entry?;
                Ok((deserialize_id(key), bincode::deserialize(&value).unwrap()))
            })
            .collect()
    }
}

/// Discards all stored users and movies. Used by `initdb --drop`.
pub fn drop_all(db: &sled::Db) -> sled::Result<()> {
    db.drop_tree(USER)?;
    db.drop_tree(MOVIES)?;
    Ok(())
}
