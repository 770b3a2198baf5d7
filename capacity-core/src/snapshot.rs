//! Binary ledger snapshot decoder
//!
//! Layout (big-endian counts and indices, no padding):
//!
//! ```text
//! u32 address_count
//! address_count      × [u8; 20]
//! u32 organization_count
//! organization_count × u32 address_index
//! u32 trust_edge_count
//! trust_edge_count   × (u32 from, u32 to, u8 percent)
//! u32 balance_count
//! balance_count      × (u32 token_owner, u32 holder, u8 len, len bytes)
//! ```
//!
//! Balance magnitudes are little-endian over their `len` bytes, unlike
//! every other field.

use crate::{
    types::{AccountId, Address, Amount, BalanceTable, TrustTable, ADDRESS_LEN},
    Error, Result,
};
use bytes::Buf;
use std::collections::BTreeSet;
use std::path::Path;

/// Highest meaningful trust percentage
pub const MAX_TRUST_PERCENT: u8 = 100;

/// Decoded snapshot: the context shared by the capacity engine and the
/// graph builder. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// `truster -> {trustee -> percent}`
    pub trust: TrustTable,

    /// `holder -> {token_owner -> amount}`
    pub balances: BalanceTable,

    /// Accounts flagged as organizations
    pub organizations: BTreeSet<AccountId>,
}

impl Snapshot {
    /// Read and decode a snapshot file
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        tracing::info!("Read {} snapshot bytes from {}", data.len(), path.display());
        Self::decode(&data)
    }

    /// Decode a snapshot from raw bytes.
    ///
    /// Fails with [`Error::Format`] on truncation, trailing bytes or a trust
    /// percentage above 100, and with [`Error::Reference`] when an index
    /// falls outside the address table.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = SnapshotReader::new(data);

        let address_count = reader.count("address", ADDRESS_LEN)?;
        let mut addresses = Vec::with_capacity(address_count);
        for _ in 0..address_count {
            addresses.push(reader.address()?.to_account_id());
        }
        tracing::debug!("Decoded {} addresses", addresses.len());

        let organization_count = reader.count("organization", 4)?;
        let mut organizations = BTreeSet::new();
        for _ in 0..organization_count {
            let index = reader.u32("organization index")?;
            organizations.insert(lookup(&addresses, "organization", index)?.clone());
        }
        tracing::debug!("Decoded {} organizations", organizations.len());

        let trust_count = reader.count("trust edge", 9)?;
        let mut trust = TrustTable::new();
        for _ in 0..trust_count {
            let from = reader.u32("trust from index")?;
            let to = reader.u32("trust to index")?;
            let percent = reader.u8("trust percent")?;
            if percent > MAX_TRUST_PERCENT {
                return Err(Error::format(format!(
                    "trust percent {} exceeds {}",
                    percent, MAX_TRUST_PERCENT
                )));
            }
            trust.insert(
                lookup(&addresses, "trust", from)?.clone(),
                lookup(&addresses, "trust", to)?.clone(),
                percent,
            );
        }
        tracing::debug!("Decoded {} trust edges", trust_count);

        let balance_count = reader.count("balance", 9)?;
        let mut balances = BalanceTable::new();
        for _ in 0..balance_count {
            // Token owner comes first, holder second.
            let token_owner = reader.u32("balance to index")?;
            let holder = reader.u32("balance from index")?;
            let amount = reader.amount()?;
            balances.insert(
                lookup(&addresses, "balance", holder)?.clone(),
                lookup(&addresses, "balance", token_owner)?.clone(),
                amount,
            );
        }
        tracing::debug!("Decoded {} balances", balance_count);

        if reader.remaining() > 0 {
            return Err(Error::format(format!(
                "{} trailing bytes after balance section",
                reader.remaining()
            )));
        }

        tracing::info!(
            "Snapshot decoded: {} addresses, {} organizations, {} trust edges, {} balances",
            address_count,
            organizations.len(),
            trust.edge_count(),
            balances.edge_count()
        );

        Ok(Self {
            trust,
            balances,
            organizations,
        })
    }

    /// True when `account` is flagged as an organization
    pub fn is_organization(&self, account: &AccountId) -> bool {
        self.organizations.contains(account)
    }
}

fn lookup<'a>(
    addresses: &'a [AccountId],
    section: &'static str,
    index: u32,
) -> Result<&'a AccountId> {
    addresses.get(index as usize).ok_or(Error::Reference {
        section,
        index,
        address_count: addresses.len(),
    })
}

/// Bounds-checked cursor over the snapshot bytes
struct SnapshotReader<'a> {
    buf: &'a [u8],
}

impl<'a> SnapshotReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize, what: &str) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(Error::format(format!(
                "truncated snapshot: {} needs {} bytes, {} left",
                what,
                needed,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        self.ensure(1, what)?;
        Ok(self.buf.get_u8())
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        self.ensure(4, what)?;
        Ok(self.buf.get_u32())
    }

    /// Section count, rejected early when the stream cannot possibly hold
    /// `count` records of at least `min_record_len` bytes.
    fn count(&mut self, section: &str, min_record_len: usize) -> Result<usize> {
        let count = self.u32(section)? as usize;
        let needed = count.saturating_mul(min_record_len);
        if needed > self.buf.remaining() {
            return Err(Error::format(format!(
                "declared {} {} records need at least {} bytes, {} left",
                count,
                section,
                needed,
                self.buf.remaining()
            )));
        }
        Ok(count)
    }

    fn address(&mut self) -> Result<Address> {
        self.ensure(ADDRESS_LEN, "address")?;
        let mut bytes = [0u8; ADDRESS_LEN];
        self.buf.copy_to_slice(&mut bytes);
        Ok(Address::from_bytes(bytes))
    }

    fn amount(&mut self) -> Result<Amount> {
        let len = self.u8("balance length")? as usize;
        self.ensure(len, "balance magnitude")?;
        let amount = Amount::from_bytes_le(&self.buf[..len]);
        self.buf.advance(len);
        Ok(amount)
    }
}

/// Encoder for the snapshot layout, used to build fixtures.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    addresses: Vec<Address>,
    organizations: Vec<u32>,
    trust: Vec<(u32, u32, u8)>,
    balances: Vec<(u32, u32, Vec<u8>)>,
}

impl SnapshotBuilder {
    /// Create empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an address, returning its index
    pub fn address(&mut self, address: Address) -> u32 {
        self.addresses.push(address);
        (self.addresses.len() - 1) as u32
    }

    /// Flag the address at `index` as an organization
    pub fn organization(&mut self, index: u32) -> &mut Self {
        self.organizations.push(index);
        self
    }

    /// Record that `from` trusts `to` with `percent`
    pub fn trust(&mut self, from: u32, to: u32, percent: u8) -> &mut Self {
        self.trust.push((from, to, percent));
        self
    }

    /// Record that `holder` holds `amount` of `token_owner`'s tokens
    pub fn balance(&mut self, holder: u32, token_owner: u32, amount: &Amount) -> &mut Self {
        let mut magnitude = amount.to_bytes_le();
        while magnitude.last() == Some(&0) {
            magnitude.pop();
        }
        self.balances.push((token_owner, holder, magnitude));
        self
    }

    /// Serialize to the binary layout
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.addresses.len() as u32).to_be_bytes());
        for address in &self.addresses {
            out.extend_from_slice(address.as_bytes());
        }
        out.extend_from_slice(&(self.organizations.len() as u32).to_be_bytes());
        for index in &self.organizations {
            out.extend_from_slice(&index.to_be_bytes());
        }
        out.extend_from_slice(&(self.trust.len() as u32).to_be_bytes());
        for (from, to, percent) in &self.trust {
            out.extend_from_slice(&from.to_be_bytes());
            out.extend_from_slice(&to.to_be_bytes());
            out.push(*percent);
        }
        out.extend_from_slice(&(self.balances.len() as u32).to_be_bytes());
        for (token_owner, holder, magnitude) in &self.balances {
            out.extend_from_slice(&token_owner.to_be_bytes());
            out.extend_from_slice(&holder.to_be_bytes());
            out.push(magnitude.len() as u8);
            out.extend_from_slice(magnitude);
        }
        out
    }
}
