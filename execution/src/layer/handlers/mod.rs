use super::*;

fn ensure_owner(owner: &PublicKey, public: &PublicKey) -> Result<(), SpinError> {
    if public != owner {
        return Err(SpinError::NotOwner);
    }
    Ok(())
}

fn ensure_unpayable(value: u64) -> Result<(), SpinError> {
    if value > 0 {
        return Err(SpinError::UnexpectedValue { sent: value });
    }
    Ok(())
}

mod spin;
mod treasury;
