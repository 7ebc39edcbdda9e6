use std::collections::{HashMap, HashSet};
use std::time::Duration;

use bytes::Bytes;
use iced::{executor, Application, Command, Theme};
use tracing::info;

use crate::api::{self, ApiClient, ApiError};
use crate::auth;
use crate::collection::{CollectionStore, SortDir, SortKey, ViewTarget};
use crate::deck::EditSession;
use crate::models::{CollectionData, FriendsData, PackCard, PackData, RequestAction, UserSummary};
use crate::views;

const TOAST_DURATION: Duration = Duration::from_secs(3);

pub struct App {
    pub(crate) api: ApiClient,
    pub(crate) screen: Screen,
    // auth forms
    pub(crate) display_name: String,
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) auth_busy: bool,
    // main navigation
    pub(crate) active_tab: Tab,
    // collection + deck builder
    pub(crate) collection: Option<CollectionStore>,
    pub(crate) collection_loading: bool,
    pub(crate) collection_error: Option<String>,
    pub(crate) search_text: String,
    pub(crate) sort_key: SortKey,
    pub(crate) sort_dir: SortDir,
    pub(crate) active_deck: usize,
    pub(crate) session: Option<EditSession>,
    pub(crate) picked_card: Option<String>,
    pub(crate) saving: bool,
    // store
    pub(crate) opening_pack: bool,
    pub(crate) pack_message: Option<String>,
    pub(crate) pack_cards: Vec<PackCard>,
    pub(crate) pack_error: Option<String>,
    // friends
    pub(crate) friends: Option<FriendsData>,
    pub(crate) friends_loading: bool,
    pub(crate) friends_error: Option<String>,
    pub(crate) friend_filter: String,
    pub(crate) user_search_text: String,
    pub(crate) user_search_busy: bool,
    pub(crate) user_search_results: Option<Vec<UserSummary>>,
    pub(crate) user_search_note: Option<String>,
    pub(crate) requests_in_flight: HashSet<String>,
    pub(crate) requests_sent: HashSet<String>,
    pub(crate) friend_action_busy: bool,
    // shared
    pub(crate) image_cache: HashMap<String, Bytes>,
    pub(crate) toast: Option<Toast>,
    toast_seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Collection,
    Store,
    Friends,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub text: String,
    pub is_error: bool,
    pub id: u64,
}

#[derive(Debug, Clone)]
pub enum Message {
    // auth
    ShowRegister,
    ShowLogin,
    DisplayNameChanged(String),
    EmailChanged(String),
    PasswordChanged(String),
    SubmitLogin,
    SubmitRegister,
    LoginFinished(Result<String, ApiError>),
    Logout,
    // navigation
    ChangeTab(Tab),
    // collection
    CollectionLoaded(ViewTarget, Result<CollectionData, ApiError>),
    ViewFriendCollection { id: String, display_name: String },
    BackToOwnCollection,
    SearchChanged(String),
    SortKeyPicked(SortKey),
    SortDirToggled,
    // deck builder
    DeckPicked(usize),
    ToggleEdit,
    CardPicked(String),
    SlotClicked(usize),
    AddToDeck(String),
    RemoveFromSlot(usize),
    SaveDeck,
    DeckSaved(Result<(), ApiError>),
    // store
    OpenPack,
    PackOpened(Result<PackData, ApiError>),
    // friends
    FriendsLoaded(Result<FriendsData, ApiError>),
    FriendFilterChanged(String),
    UserSearchChanged(String),
    SubmitUserSearch,
    UserSearchFinished(Result<Vec<UserSummary>, ApiError>),
    SendFriendRequest(String),
    FriendRequestSent(String, Result<(), ApiError>),
    RespondToRequest(String, RequestAction),
    RemoveFriend(String),
    FriendActionFinished(Result<(), ApiError>),
    // shared
    ImageFetched(String, Option<Bytes>),
    ToastExpired(u64),
}

impl App {
    fn bare(api: ApiClient, screen: Screen) -> Self {
        Self {
            api,
            screen,
            display_name: String::new(),
            email: String::new(),
            password: String::new(),
            auth_busy: false,
            active_tab: Tab::Store,
            collection: None,
            collection_loading: false,
            collection_error: None,
            search_text: String::new(),
            sort_key: SortKey::default(),
            sort_dir: SortDir::default(),
            active_deck: 0,
            session: None,
            picked_card: None,
            saving: false,
            opening_pack: false,
            pack_message: None,
            pack_cards: Vec::new(),
            pack_error: None,
            friends: None,
            friends_loading: false,
            friends_error: None,
            friend_filter: String::new(),
            user_search_text: String::new(),
            user_search_busy: false,
            user_search_results: None,
            user_search_note: None,
            requests_in_flight: HashSet::new(),
            requests_sent: HashSet::new(),
            friend_action_busy: false,
            image_cache: HashMap::new(),
            toast: None,
            toast_seq: 0,
        }
    }

    fn toast(&mut self, text: impl Into<String>, is_error: bool) -> Command<Message> {
        self.toast_seq += 1;
        let id = self.toast_seq;
        self.toast = Some(Toast {
            text: text.into(),
            is_error,
            id,
        });
        Command::perform(
            async move {
                tokio::time::sleep(TOAST_DURATION).await;
                id
            },
            Message::ToastExpired,
        )
    }

    /// Clears all session state and returns to the login screen. Used for
    /// explicit logout and for any 401, which is never shown as a toast.
    fn forced_logout(&mut self) {
        auth::store_token(None);
        let api = self.api.with_token(None);
        *self = App::bare(api, Screen::Login);
    }

    /// Default handling for errors from background actions: 401 logs out
    /// silently, everything else is a dismissible toast.
    fn surface(&mut self, error: ApiError) -> Command<Message> {
        match error {
            ApiError::Unauthorized => {
                self.forced_logout();
                Command::none()
            }
            other => self.toast(other.to_string(), true),
        }
    }

    /// Begins a wholesale collection load for `target`, resetting every
    /// piece of collection-view state including the deck selection. Used
    /// for tab entry and friend/back navigation.
    fn start_collection_load(&mut self, target: ViewTarget) -> Command<Message> {
        self.active_deck = 0;
        self.reload_collection(target)
    }

    /// Post-save reload: same wholesale replacement, but the deck selection
    /// survives so the hotbar still shows the deck that was just saved.
    fn reload_own_collection(&mut self) -> Command<Message> {
        self.reload_collection(ViewTarget::Own)
    }

    fn reload_collection(&mut self, target: ViewTarget) -> Command<Message> {
        self.collection_loading = true;
        self.collection_error = None;
        self.session = None;
        self.picked_card = None;
        self.saving = false;
        self.search_text.clear();
        self.sort_key = SortKey::default();
        self.sort_dir = SortDir::default();
        let api = self.api.clone();
        Command::perform(
            async move {
                let result = api.load_collection(&target).await;
                (target, result)
            },
            |(target, result)| Message::CollectionLoaded(target, result),
        )
    }

    fn start_friends_load(&mut self) -> Command<Message> {
        self.friends_loading = true;
        self.friends_error = None;
        let api = self.api.clone();
        Command::perform(async move { api.friends().await }, Message::FriendsLoaded)
    }

    fn fetch_missing_images<'a>(
        &self,
        urls: impl Iterator<Item = &'a str>,
    ) -> Command<Message> {
        Command::batch(
            urls.filter(|url| !url.is_empty() && !self.image_cache.contains_key(*url))
                .map(|url| {
                    Command::perform(api::download_image(url.to_owned()), |(url, bytes)| {
                        Message::ImageFetched(url, bytes)
                    })
                }),
        )
    }
}

impl Application for App {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = ();

    fn new(_flags: Self::Flags) -> (Self, Command<Self::Message>) {
        let token = auth::load_token();
        let api = ApiClient::from_env().with_token(token.clone());
        let screen = if token.is_some() {
            Screen::Main
        } else {
            Screen::Login
        };
        (App::bare(api, screen), Command::none())
    }

    fn title(&self) -> String {
        "CardForge".to_owned()
    }

    fn theme(&self) -> Self::Theme {
        Theme::Dark
    }

    fn update(&mut self, message: Self::Message) -> Command<Self::Message> {
        match message {
            // --- auth ---
            Message::ShowRegister => {
                self.screen = Screen::Register;
                self.password.clear();
            }
            Message::ShowLogin => {
                self.screen = Screen::Login;
                self.password.clear();
            }
            Message::DisplayNameChanged(value) => self.display_name = value,
            Message::EmailChanged(value) => self.email = value,
            Message::PasswordChanged(value) => self.password = value,
            Message::SubmitLogin => {
                if self.auth_busy || self.email.is_empty() || self.password.is_empty() {
                    return Command::none();
                }
                self.auth_busy = true;
                let api = self.api.clone();
                let email = self.email.clone();
                let password = self.password.clone();
                return Command::perform(
                    async move { api.login(&email, &password).await },
                    Message::LoginFinished,
                );
            }
            Message::SubmitRegister => {
                if self.auth_busy
                    || self.display_name.is_empty()
                    || self.email.is_empty()
                    || self.password.is_empty()
                {
                    return Command::none();
                }
                self.auth_busy = true;
                let api = self.api.clone();
                let display_name = self.display_name.clone();
                let email = self.email.clone();
                let password = self.password.clone();
                // Register, then sign straight in with the same credentials.
                return Command::perform(
                    async move {
                        api.register(&display_name, &email, &password).await?;
                        api.login(&email, &password).await
                    },
                    Message::LoginFinished,
                );
            }
            Message::LoginFinished(result) => {
                self.auth_busy = false;
                match result {
                    Ok(token) => {
                        info!("signed in");
                        auth::store_token(Some(&token));
                        let api = self.api.with_token(Some(token));
                        *self = App::bare(api, Screen::Main);
                    }
                    Err(error) => {
                        let text = match error {
                            ApiError::Unauthorized => "Login failed.".to_owned(),
                            other => other.to_string(),
                        };
                        return self.toast(text, true);
                    }
                }
            }
            Message::Logout => self.forced_logout(),

            // --- navigation ---
            Message::ChangeTab(tab) => {
                self.active_tab = tab;
                match tab {
                    Tab::Collection => return self.start_collection_load(ViewTarget::Own),
                    Tab::Friends => {
                        self.user_search_text.clear();
                        self.user_search_results = None;
                        self.user_search_note = None;
                        self.friend_filter.clear();
                        self.requests_sent.clear();
                        return self.start_friends_load();
                    }
                    Tab::Store => {
                        self.pack_message = None;
                        self.pack_cards.clear();
                        self.pack_error = None;
                    }
                }
            }

            // --- collection ---
            Message::CollectionLoaded(target, result) => match result {
                Ok(data) => {
                    self.collection_loading = false;
                    let store = CollectionStore::new(target, data);
                    self.active_deck = self
                        .active_deck
                        .min(store.deck_count().saturating_sub(1));
                    let fetch =
                        self.fetch_missing_images(store.inventory.iter().map(|c| c.image.as_str()));
                    self.collection = Some(store);
                    return fetch;
                }
                Err(ApiError::Unauthorized) => self.forced_logout(),
                Err(error) => {
                    self.collection_loading = false;
                    self.collection_error = Some(error.to_string());
                }
            },
            Message::ViewFriendCollection { id, display_name } => {
                self.active_tab = Tab::Collection;
                return self.start_collection_load(ViewTarget::Friend { id, display_name });
            }
            Message::BackToOwnCollection => {
                return self.start_collection_load(ViewTarget::Own);
            }
            Message::SearchChanged(value) => self.search_text = value,
            Message::SortKeyPicked(key) => self.sort_key = key,
            Message::SortDirToggled => self.sort_dir = self.sort_dir.toggled(),

            // --- deck builder ---
            Message::DeckPicked(index) => {
                // The selector is disabled while editing; ignore stray events.
                if self.session.is_none() {
                    self.active_deck = index;
                }
            }
            Message::ToggleEdit => {
                if self.session.take().is_some() {
                    // Cancel: the draft is discarded, nothing touches the server.
                    self.picked_card = None;
                } else if let Some(store) = &self.collection {
                    if store.target.is_own() && store.deck_count() > 0 {
                        self.session =
                            Some(EditSession::begin(self.active_deck, store.deck(self.active_deck)));
                    }
                }
            }
            Message::CardPicked(card_id) => {
                if self.session.is_some() {
                    self.picked_card = if self.picked_card.as_deref() == Some(card_id.as_str()) {
                        None
                    } else {
                        Some(card_id)
                    };
                }
            }
            Message::SlotClicked(slot) => {
                if let (Some(session), Some(card_id)) = (&mut self.session, self.picked_card.take())
                {
                    if let Err(error) = session.assign(&card_id, slot) {
                        return self.toast(error.to_string(), true);
                    }
                }
            }
            Message::AddToDeck(card_id) => {
                if let Some(session) = &mut self.session {
                    if self.picked_card.as_deref() == Some(card_id.as_str()) {
                        self.picked_card = None;
                    }
                    if let Err(error) = session.assign_first_empty(&card_id) {
                        return self.toast(error.to_string(), true);
                    }
                }
            }
            Message::RemoveFromSlot(slot) => {
                if let Some(session) = &mut self.session {
                    session.unassign(slot);
                }
            }
            Message::SaveDeck => {
                if self.saving {
                    return Command::none();
                }
                let Some(session) = &self.session else {
                    return Command::none();
                };
                self.saving = true;
                let api = self.api.clone();
                let deck_index = session.deck_index();
                let cards = session.pack();
                return Command::perform(
                    async move { api.save_deck(deck_index, cards).await },
                    Message::DeckSaved,
                );
            }
            Message::DeckSaved(result) => {
                self.saving = false;
                match result {
                    Ok(()) => {
                        self.session = None;
                        self.picked_card = None;
                        // The server owns the persisted list; reload instead of
                        // trusting the local draft.
                        return Command::batch([
                            self.toast("Deck saved successfully!", false),
                            self.reload_own_collection(),
                        ]);
                    }
                    // Stay in edit mode so nothing is lost on failure.
                    Err(error) => return self.surface(error),
                }
            }

            // --- store ---
            Message::OpenPack => {
                if self.opening_pack {
                    return Command::none();
                }
                self.opening_pack = true;
                self.pack_message = None;
                self.pack_cards.clear();
                self.pack_error = None;
                let api = self.api.clone();
                return Command::perform(async move { api.open_pack().await }, Message::PackOpened);
            }
            Message::PackOpened(result) => {
                self.opening_pack = false;
                match result {
                    Ok(data) => {
                        self.pack_message =
                            Some(data.message.unwrap_or_else(|| "You opened a pack!".to_owned()));
                        self.pack_cards = data.cards;
                        return self
                            .fetch_missing_images(self.pack_cards.iter().map(|c| c.image.as_str()));
                    }
                    Err(ApiError::Unauthorized) => self.forced_logout(),
                    Err(error) => self.pack_error = Some(error.to_string()),
                }
            }

            // --- friends ---
            Message::FriendsLoaded(result) => {
                self.friends_loading = false;
                match result {
                    Ok(data) => self.friends = Some(data),
                    Err(ApiError::Unauthorized) => self.forced_logout(),
                    Err(error) => self.friends_error = Some(error.to_string()),
                }
            }
            Message::FriendFilterChanged(value) => self.friend_filter = value,
            Message::UserSearchChanged(value) => self.user_search_text = value,
            Message::SubmitUserSearch => {
                if self.user_search_busy {
                    return Command::none();
                }
                let query = self.user_search_text.trim().to_owned();
                if query.chars().count() < 3 {
                    self.user_search_note =
                        Some("Please enter at least 3 characters.".to_owned());
                    self.user_search_results = None;
                    return Command::none();
                }
                self.user_search_busy = true;
                self.user_search_note = None;
                let api = self.api.clone();
                return Command::perform(
                    async move { api.search_users(&query).await },
                    Message::UserSearchFinished,
                );
            }
            Message::UserSearchFinished(result) => {
                self.user_search_busy = false;
                match result {
                    Ok(users) if users.is_empty() => {
                        self.user_search_results = None;
                        self.user_search_note = Some("No users found.".to_owned());
                    }
                    Ok(users) => self.user_search_results = Some(users),
                    Err(ApiError::Unauthorized) => self.forced_logout(),
                    Err(error) => {
                        self.user_search_results = None;
                        self.user_search_note = Some(error.to_string());
                    }
                }
            }
            Message::SendFriendRequest(recipient_id) => {
                if self.requests_in_flight.contains(&recipient_id)
                    || self.requests_sent.contains(&recipient_id)
                {
                    return Command::none();
                }
                self.requests_in_flight.insert(recipient_id.clone());
                let api = self.api.clone();
                return Command::perform(
                    async move {
                        let result = api.send_friend_request(&recipient_id).await;
                        (recipient_id, result)
                    },
                    |(recipient, result)| Message::FriendRequestSent(recipient, result),
                );
            }
            Message::FriendRequestSent(recipient, result) => {
                self.requests_in_flight.remove(&recipient);
                match result {
                    Ok(()) => {
                        self.requests_sent.insert(recipient);
                    }
                    Err(error) => return self.surface(error),
                }
            }
            Message::RespondToRequest(other_user_id, action) => {
                if self.friend_action_busy {
                    return Command::none();
                }
                self.friend_action_busy = true;
                let api = self.api.clone();
                return Command::perform(
                    async move { api.respond_to_request(&other_user_id, action).await },
                    Message::FriendActionFinished,
                );
            }
            Message::RemoveFriend(friend_id) => {
                if self.friend_action_busy {
                    return Command::none();
                }
                self.friend_action_busy = true;
                let api = self.api.clone();
                return Command::perform(
                    async move { api.remove_friend(&friend_id).await },
                    Message::FriendActionFinished,
                );
            }
            Message::FriendActionFinished(result) => {
                self.friend_action_busy = false;
                match result {
                    Ok(()) => return self.start_friends_load(),
                    Err(error) => return self.surface(error),
                }
            }

            // --- shared ---
            Message::ImageFetched(url, bytes) => {
                if let Some(bytes) = bytes {
                    self.image_cache.insert(url, bytes);
                }
            }
            Message::ToastExpired(id) => {
                if self.toast.as_ref().is_some_and(|t| t.id == id) {
                    self.toast = None;
                }
            }
        };

        Command::none()
    }

    fn view(&self) -> iced::Element<'_, Self::Message, Self::Theme, iced::Renderer> {
        match self.screen {
            Screen::Login => views::login(self),
            Screen::Register => views::register(self),
            Screen::Main => views::main_screen(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Card, Tier};

    fn card(id: &str) -> Card {
        Card {
            id: id.to_owned(),
            name: format!("Card {id}"),
            number: 1,
            // Empty image URL keeps the loaded-collection path from queueing
            // image downloads in tests.
            image: String::new(),
            ap: 1,
            hp: 1,
            tier: Tier::Champion,
            ability: None,
        }
    }

    fn loaded_app() -> App {
        let mut app = App::bare(ApiClient::new("http://localhost:0"), Screen::Main);
        app.active_tab = Tab::Collection;
        let data = CollectionData {
            inventory: vec![card("A"), card("B"), card("C")],
            decks: Some(vec![vec!["A".to_owned(), "B".to_owned()], vec![], vec![]]),
        };
        let _ = app.update(Message::CollectionLoaded(ViewTarget::Own, Ok(data)));
        app
    }

    #[test]
    fn entering_edit_copies_the_active_deck_and_locks_the_selector() {
        let mut app = loaded_app();
        let _ = app.update(Message::ToggleEdit);
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.slots()[0].as_deref(), Some("A"));
        assert_eq!(session.slots()[1].as_deref(), Some("B"));

        // Selector changes are ignored while a session is open.
        let _ = app.update(Message::DeckPicked(2));
        assert_eq!(app.active_deck, 0);
    }

    #[test]
    fn cancel_discards_the_draft_and_leaves_the_store_untouched() {
        let mut app = loaded_app();
        let _ = app.update(Message::ToggleEdit);
        let _ = app.update(Message::AddToDeck("C".to_owned()));
        assert!(app.session.as_ref().unwrap().contains("C"));

        let _ = app.update(Message::ToggleEdit);
        assert!(app.session.is_none());
        assert_eq!(
            app.collection.as_ref().unwrap().deck(0),
            ["A".to_owned(), "B".to_owned()]
        );
    }

    #[test]
    fn pick_and_place_assigns_to_the_clicked_slot() {
        let mut app = loaded_app();
        let _ = app.update(Message::ToggleEdit);
        let _ = app.update(Message::CardPicked("C".to_owned()));
        let _ = app.update(Message::SlotClicked(5));
        assert_eq!(app.session.as_ref().unwrap().slots()[5].as_deref(), Some("C"));
        assert!(app.picked_card.is_none());
    }

    #[test]
    fn duplicate_drop_is_rejected_with_a_toast() {
        let mut app = loaded_app();
        let _ = app.update(Message::ToggleEdit);
        let _ = app.update(Message::CardPicked("A".to_owned()));
        let _ = app.update(Message::SlotClicked(5));
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.slots()[5], None);
        assert_eq!(session.slots()[0].as_deref(), Some("A"));
        assert!(app.toast.as_ref().is_some_and(|t| t.is_error));
    }

    #[test]
    fn failed_save_stays_in_edit_mode() {
        let mut app = loaded_app();
        let _ = app.update(Message::ToggleEdit);
        let _ = app.update(Message::DeckSaved(Err(ApiError::Rejected(
            "Deck rejected.".to_owned(),
        ))));
        assert!(app.session.is_some());
        assert!(!app.saving);
        assert_eq!(app.toast.as_ref().unwrap().text, "Deck rejected.");
    }

    #[test]
    fn successful_save_exits_edit_mode_and_reloads() {
        let mut app = loaded_app();
        let _ = app.update(Message::ToggleEdit);
        let _ = app.update(Message::DeckSaved(Ok(())));
        assert!(app.session.is_none());
        assert!(app.collection_loading);
        assert!(app.toast.as_ref().is_some_and(|t| !t.is_error));
    }

    #[test]
    fn successful_save_keeps_the_selected_deck() {
        let mut app = loaded_app();
        let _ = app.update(Message::DeckPicked(1));
        let _ = app.update(Message::ToggleEdit);
        let _ = app.update(Message::DeckSaved(Ok(())));
        assert_eq!(app.active_deck, 1);

        // The selection survives the round trip through the reload.
        let data = CollectionData {
            inventory: vec![card("A"), card("B"), card("C")],
            decks: Some(vec![vec![], vec!["C".to_owned()], vec![]]),
        };
        let _ = app.update(Message::CollectionLoaded(ViewTarget::Own, Ok(data)));
        assert_eq!(app.active_deck, 1);

        // Leaving and re-entering the tab goes back to the first deck.
        let _ = app.update(Message::ChangeTab(Tab::Collection));
        assert_eq!(app.active_deck, 0);
    }

    #[test]
    fn unauthorized_reply_forces_a_silent_logout() {
        let mut app = loaded_app();
        let _ = app.update(Message::FriendsLoaded(Err(ApiError::Unauthorized)));
        assert_eq!(app.screen, Screen::Login);
        assert!(app.toast.is_none());
        assert!(app.collection.is_none());
    }

    #[test]
    fn friend_collections_never_show_a_deck_panel() {
        let mut app = App::bare(ApiClient::new("http://localhost:0"), Screen::Main);
        let target = ViewTarget::Friend {
            id: "u1".to_owned(),
            display_name: "Rin".to_owned(),
        };
        let data = CollectionData {
            inventory: vec![card("A")],
            decks: None,
        };
        let _ = app.update(Message::CollectionLoaded(target, Ok(data)));
        let store = app.collection.as_ref().unwrap();
        assert!(!store.target.is_own());
        assert_eq!(store.deck_count(), 0);

        // Edit mode cannot be entered on a read-only collection.
        let _ = app.update(Message::ToggleEdit);
        assert!(app.session.is_none());
    }
}
