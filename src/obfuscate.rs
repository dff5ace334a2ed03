use crate::model::DailyBucket;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Replaces identifying fields of a per-commit bucket before it is folded.
pub trait Obfuscator: Send + Sync {
    fn obfuscate(&self, bucket: &mut DailyBucket);
}

/// Replaces author emails and library identifiers with salted SHA-256
/// digests. Dates, languages and counts are left as they are.
#[derive(Debug, Clone, Default)]
pub struct HashObfuscator {
    salt: String,
}

impl HashObfuscator {
    pub fn new(seed: &[String]) -> Self {
        Self { salt: seed.concat() }
    }

    pub fn hash(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(value.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl Obfuscator for HashObfuscator {
    fn obfuscate(&self, bucket: &mut DailyBucket) {
        for email in bucket.author_emails.iter_mut() {
            *email = self.hash(email);
        }
        let libraries = std::mem::take(&mut bucket.libraries);
        bucket.libraries = libraries
            .into_iter()
            .map(|(lang, libs)| (lang, libs.iter().map(|l| self.hash(l)).collect()))
            .collect::<BTreeMap<_, _>>();
    }
}
