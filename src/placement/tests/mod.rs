mod common;
mod invitations;
