use crate::domain::profile::Profile;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ProfileRow<'a> {
    user: &'a str,
    role: &'a str,
    balance: Decimal,
    total_loaded: Decimal,
    withdrawable: Decimal,
    status: &'a str,
}

/// Writes the final profile balances as CSV, sorted by user id.
pub struct ProfileWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ProfileWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_profiles(mut self, mut profiles: Vec<Profile>) -> Result<()> {
        profiles.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        for profile in &profiles {
            self.writer.serialize(ProfileRow {
                user: &profile.user_id,
                role: profile.role.as_str(),
                balance: profile.balance.value(),
                total_loaded: profile.total_loaded.value(),
                withdrawable: profile.withdrawable_balance.value(),
                status: profile.status.as_str(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{Balance, Role};
    use rust_decimal_macros::dec;

    #[test]
    fn test_writer_sorts_by_user() {
        let mut maria = Profile::new_client("maria@desk.io", None, None);
        maria.role = Role::Agent;
        let mut ana = Profile::new_client("ana@example.com", None, None);
        ana.balance = Balance::new(dec!(750));
        ana.total_loaded = Balance::new(dec!(750));
        ana.withdrawable_balance = Balance::new(dec!(750));

        let mut out = Vec::new();
        ProfileWriter::new(&mut out)
            .write_profiles(vec![maria, ana])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "user,role,balance,total_loaded,withdrawable,status"
        );
        assert_eq!(lines[1], "ana@example.com,client,750,750,750,active");
        assert_eq!(lines[2], "maria@desk.io,agent,0,0,0,active");
    }
}
