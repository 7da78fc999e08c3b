//! In-process store used when no DSN is configured and by the test suite.
//! Nothing survives a restart.

use chrono::Utc;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Authored, Comment, InsertUserOutcome, Like, NewUser, Post, Profile, ProfileFields, Social,
    User, UserSummary,
};

#[derive(Debug, Clone)]
struct StoredProfile {
    id: Uuid,
    company: Option<String>,
    website: Option<String>,
    location: Option<String>,
    bio: Option<String>,
    status: String,
    githubusername: Option<String>,
    skills: Vec<String>,
    social: Social,
    date: chrono::DateTime<Utc>,
    seq: u64,
}

#[derive(Debug, Clone)]
struct StoredPost {
    post: Post,
    seq: u64,
}

#[derive(Debug, Default)]
struct Documents {
    users: HashMap<Uuid, User>,
    // keyed by owner id
    profiles: HashMap<Uuid, StoredProfile>,
    posts: HashMap<Uuid, StoredPost>,
    // insertion counter, breaks ties between equal timestamps
    next_seq: u64,
}

impl Documents {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn post_mut(&mut self, id: Uuid) -> Option<&mut Post> {
        self.posts.get_mut(&id).map(|stored| &mut stored.post)
    }

    fn populate(&self, user_id: Uuid, stored: &StoredProfile) -> Option<Profile> {
        let user = self.users.get(&user_id)?;
        Some(Profile {
            id: stored.id,
            user: UserSummary {
                id: user.id,
                name: user.name.clone(),
                avatar: user.avatar.clone(),
            },
            company: stored.company.clone(),
            website: stored.website.clone(),
            location: stored.location.clone(),
            bio: stored.bio.clone(),
            status: stored.status.clone(),
            githubusername: stored.githubusername.clone(),
            skills: stored.skills.clone(),
            social: stored.social.clone(),
            date: stored.date,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<Documents>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) async fn find_user_by_id(&self, id: Uuid) -> Option<User> {
        self.documents.read().await.users.get(&id).cloned()
    }

    pub(super) async fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.documents
            .read()
            .await
            .users
            .values()
            .find(|user| user.email == email)
            .cloned()
    }

    pub(super) async fn insert_user(&self, new_user: NewUser) -> InsertUserOutcome {
        let mut documents = self.documents.write().await;
        if documents
            .users
            .values()
            .any(|user| user.email == new_user.email)
        {
            return InsertUserOutcome::EmailTaken;
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            avatar: new_user.avatar,
            password_hash: new_user.password_hash,
            date: Utc::now(),
        };
        documents.users.insert(user.id, user.clone());
        InsertUserOutcome::Created(user)
    }

    pub(super) async fn find_profile_by_user(&self, user_id: Uuid) -> Option<Profile> {
        let documents = self.documents.read().await;
        let stored = documents.profiles.get(&user_id)?;
        documents.populate(user_id, stored)
    }

    pub(super) async fn list_profiles(&self) -> Vec<Profile> {
        let documents = self.documents.read().await;
        let mut stored: Vec<(&Uuid, &StoredProfile)> = documents.profiles.iter().collect();
        stored.sort_by_key(|(_, profile)| (profile.date, profile.seq));
        stored
            .into_iter()
            .filter_map(|(user_id, profile)| documents.populate(*user_id, profile))
            .collect()
    }

    pub(super) async fn upsert_profile(&self, fields: ProfileFields) -> Option<Profile> {
        let mut documents = self.documents.write().await;
        let user_id = fields.user_id;

        let stored = match documents.profiles.remove(&user_id) {
            Some(existing) => StoredProfile {
                id: existing.id,
                company: fields.company.or(existing.company),
                website: fields.website.or(existing.website),
                location: fields.location.or(existing.location),
                bio: fields.bio.or(existing.bio),
                status: fields.status,
                githubusername: fields.githubusername.or(existing.githubusername),
                skills: fields.skills,
                social: fields.social,
                date: existing.date,
                seq: existing.seq,
            },
            None => StoredProfile {
                id: Uuid::new_v4(),
                company: fields.company,
                website: fields.website,
                location: fields.location,
                bio: fields.bio,
                status: fields.status,
                githubusername: fields.githubusername,
                skills: fields.skills,
                social: fields.social,
                date: Utc::now(),
                seq: documents.next_seq(),
            },
        };

        let profile = documents.populate(user_id, &stored);
        documents.profiles.insert(user_id, stored);
        profile
    }

    pub(super) async fn insert_post(&self, new_post: Authored) -> Post {
        let post = Post {
            id: Uuid::new_v4(),
            user: new_post.user_id,
            text: new_post.text,
            name: new_post.name,
            avatar: new_post.avatar,
            likes: Vec::new(),
            comments: Vec::new(),
            date: Utc::now(),
        };
        let mut documents = self.documents.write().await;
        let seq = documents.next_seq();
        documents.posts.insert(
            post.id,
            StoredPost {
                post: post.clone(),
                seq,
            },
        );
        post
    }

    pub(super) async fn list_posts(&self) -> Vec<Post> {
        let documents = self.documents.read().await;
        let mut stored: Vec<&StoredPost> = documents.posts.values().collect();
        stored.sort_by(|a, b| (b.post.date, b.seq).cmp(&(a.post.date, a.seq)));
        stored.into_iter().map(|stored| stored.post.clone()).collect()
    }

    pub(super) async fn find_post(&self, id: Uuid) -> Option<Post> {
        self.documents
            .read()
            .await
            .posts
            .get(&id)
            .map(|stored| stored.post.clone())
    }

    pub(super) async fn delete_post(&self, id: Uuid) -> bool {
        self.documents.write().await.posts.remove(&id).is_some()
    }

    pub(super) async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> bool {
        let mut documents = self.documents.write().await;
        let Some(post) = documents.post_mut(post_id) else {
            return false;
        };
        if post.liked_by(user_id) {
            return false;
        }
        post.likes.insert(0, Like { user: user_id });
        true
    }

    pub(super) async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> bool {
        let mut documents = self.documents.write().await;
        let Some(post) = documents.post_mut(post_id) else {
            return false;
        };
        let before = post.likes.len();
        post.likes.retain(|like| like.user != user_id);
        post.likes.len() != before
    }

    pub(super) async fn add_comment(&self, post_id: Uuid, comment: Authored) -> Option<Comment> {
        let mut documents = self.documents.write().await;
        let post = documents.post_mut(post_id)?;
        let comment = Comment {
            id: Uuid::new_v4(),
            user: comment.user_id,
            text: comment.text,
            name: comment.name,
            avatar: comment.avatar,
            date: Utc::now(),
        };
        post.comments.insert(0, comment.clone());
        Some(comment)
    }

    pub(super) async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid) -> bool {
        let mut documents = self.documents.write().await;
        let Some(post) = documents.post_mut(post_id) else {
            return false;
        };
        let before = post.comments.len();
        post.comments.retain(|comment| comment.id != comment_id);
        post.comments.len() != before
    }
}
