//! Typed collection over a table.

use std::marker::PhantomData;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::journal::Fields;
use crate::query::{Limit, Predicate};
use crate::table::Table;

use super::{Entity, Tracked};

/// A table of entities of type `E`
pub struct Collection<E: Entity> {
    table: Table,
    _marker: PhantomData<E>,
}

impl<E: Entity> Collection<E> {
    /// Open the table named by `E::TABLE`
    pub fn open(config: &Config) -> Result<Self> {
        Ok(Self {
            table: Table::open(config, E::TABLE, E::ORDER)?,
            _marker: PhantomData,
        })
    }

    /// Validate and persist `entity`
    ///
    /// A first save or a save under the same key is a put; a save after the
    /// primary key changed is a rekey from the previously saved key.
    pub fn save(&mut self, entity: &mut Tracked<E>) -> Result<()> {
        if entity.deleted {
            return Err(StoreError::Validation(format!(
                "cannot save a deleted {} record",
                E::TABLE
            )));
        }

        entity.value.validate()?;
        let key = entity.value.primary_key();
        let fields = entity.value.to_fields()?;

        match entity.saved_key.as_deref() {
            Some(old) if old != key => self.table.rekey(old, &key, fields)?,
            _ => self.table.put(&key, fields)?,
        }

        entity.saved_key = Some(key);
        Ok(())
    }

    /// Save a fresh value and return its tracked handle
    pub fn insert(&mut self, value: E) -> Result<Tracked<E>> {
        let mut entity = Tracked::new(value);
        self.save(&mut entity)?;
        Ok(entity)
    }

    /// Tombstone `entity`; its key becomes free for reuse
    pub fn delete(&mut self, entity: &mut Tracked<E>) -> Result<()> {
        let key = match (&entity.saved_key, entity.deleted) {
            (Some(key), false) => key.clone(),
            _ => {
                return Err(StoreError::NotFound {
                    table: E::TABLE.to_string(),
                    id: entity.value.primary_key(),
                })
            }
        };

        self.table.delete(&key)?;
        entity.deleted = true;
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Tracked<E>>> {
        match self.table.get(id)? {
            Some(fields) => Ok(Some(Self::decode(id.to_string(), &fields)?)),
            None => Ok(None),
        }
    }

    pub fn find_one(&self, predicate: &Predicate) -> Result<Option<Tracked<E>>> {
        match self.table.find_one(predicate)? {
            Some((id, fields)) => Ok(Some(Self::decode(id, &fields)?)),
            None => Ok(None),
        }
    }

    pub fn find_many(&self, predicate: &Predicate, limit: Limit) -> Result<Vec<Tracked<E>>> {
        self.table
            .find_many(predicate, limit)?
            .into_iter()
            .map(|(id, fields)| Self::decode(id, &fields))
            .collect()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Underlying table
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn compact(&mut self) -> Result<usize> {
        self.table.compact()
    }

    pub fn close(&mut self) -> Result<()> {
        self.table.close()
    }

    fn decode(id: String, fields: &Fields) -> Result<Tracked<E>> {
        Ok(Tracked::persisted(E::from_fields(fields)?, id))
    }
}
