// Credential store backed by the system keyring.
//
// Each storage key is one keyring entry under the service name. Change
// events only reach handles in this process; the keyring has no watch API.

use sensorhub_api::{CredentialStore, Error, StorageChange, StorageEvent};
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CHANNEL_SIZE: usize = 64;

pub struct KeyringStore {
    service: String,
    events: broadcast::Sender<StorageEvent>,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            service: service.into(),
            events,
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, Error> {
        keyring::Entry::new(&self.service, key)
            .map_err(|e| Error::Storage(format!("keyring entry '{key}': {e}")))
    }

    fn emit(&self, key: &str, change: StorageChange) {
        let _ = self.events.send(StorageEvent {
            key: key.to_owned(),
            change,
        });
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Storage(format!("keyring read '{key}': {e}"))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| Error::Storage(format!("keyring write '{key}': {e}")))?;
        self.emit(key, StorageChange::Set);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, Error> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => {
                debug!(key, service = %self.service, "keyring entry removed");
                self.emit(key, StorageChange::Removed);
                Ok(true)
            }
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(Error::Storage(format!("keyring delete '{key}': {e}"))),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}
